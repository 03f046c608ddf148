// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrlayer-document — hOCR parsing and searchable-PDF synthesis.
//
// Provides the hOCR word scanner, the PDF text-layer overlay (page geometry,
// coordinate mapping, WinAnsi encoding, content-stream compositing) and the
// conversion pipeline that ties them together.

pub mod convert;
pub mod hocr;
pub mod pdf;

// Re-export the primary structs so callers can use `ocrlayer_document::Converter` etc.
pub use convert::{Converter, into_response};
pub use hocr::{HocrParser, ParseOutcome, parse_hocr};
pub use pdf::overlay::{OverlayReport, OverlaySynthesizer, Synthesis};
pub use pdf::reader::PdfReader;
