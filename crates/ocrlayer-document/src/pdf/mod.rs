// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading existing PDFs and compositing the invisible text layer.

pub mod encoding;
pub mod overlay;
pub mod placement;
pub mod reader;

#[cfg(test)]
pub(crate) mod test_support;

pub use overlay::{OverlayReport, OverlaySynthesizer, Synthesis};
pub use reader::{PageGeometry, PdfReader, looks_like_pdf};
