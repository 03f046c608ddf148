// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR Layer — Core types, errors, configuration and diagnostics shared across
// all crates.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::{OverlayConfig, ServiceConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, NullSink, TracingSink};
pub use error::OcrLayerError;
pub use types::*;
