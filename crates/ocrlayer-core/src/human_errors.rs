// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caller-facing error messages.
//
// Every error that leaves the service is mapped to a short sentence. Client
// errors keep their detail (the caller needs it to fix the request); internal
// errors are reduced to a generic message and the detail stays in the logs.

use crate::error::OcrLayerError;

/// Which side of the wire is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The request was missing data or carried undecodable bytes.
    Client,
    /// Something went wrong inside the service.
    Service,
}

/// A response-safe rendering of an [`OcrLayerError`].
#[derive(Debug, Clone)]
pub struct PublicError {
    /// Message placed in the response's `error` field.
    pub message: String,
    pub fault: Fault,
}

/// Convert an error into the message a caller is allowed to see.
pub fn public_error(err: &OcrLayerError) -> PublicError {
    match err {
        OcrLayerError::MissingInput(_) => PublicError {
            message: "Missing hocr or originalPdf data".into(),
            fault: Fault::Client,
        },
        OcrLayerError::InvalidEncoding(detail) => PublicError {
            message: format!("originalPdf is not valid base64: {detail}"),
            fault: Fault::Client,
        },
        OcrLayerError::InvalidPdf(_) => PublicError {
            message: "originalPdf does not contain a PDF document".into(),
            fault: Fault::Client,
        },
        OcrLayerError::PdfError(_) | OcrLayerError::Config(_) | OcrLayerError::Internal(_) => {
            PublicError {
                message: "Conversion failed due to an internal error".into(),
                fault: Fault::Service,
            }
        }
    }
}
