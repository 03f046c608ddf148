// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for OCR Layer.

use thiserror::Error;

/// Top-level error type for all OCR Layer operations.
///
/// Parse problems and overlay failures have no variant here: those degrade
/// in place (skipped words, original-PDF passthrough) and never reach the
/// caller as errors.
#[derive(Debug, Error)]
pub enum OcrLayerError {
    // -- Client input errors --
    #[error("missing {0} data")]
    MissingInput(&'static str),

    #[error("invalid byte encoding: {0}")]
    InvalidEncoding(String),

    #[error("original document is not a PDF: {0}")]
    InvalidPdf(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Everything else --
    #[error("internal error: {0}")]
    Internal(String),
}

impl OcrLayerError {
    /// Whether the error was caused by the request itself rather than by the
    /// service. Client errors are rejected before the core runs.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput(_) | Self::InvalidEncoding(_) | Self::InvalidPdf(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OcrLayerError>;
