// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for OCR Layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a conversion request, carried in log spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned rectangle in hOCR pixel space (top-left origin, y down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    /// Build a box, rejecting inverted corners.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Option<Self> {
        if x2 < x1 || y2 < y1 {
            return None;
        }
        Some(Self { x1, y1, x2, y2 })
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Zero-area boxes are legal hOCR and must be tolerated downstream.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bbox {} {} {} {}", self.x1, self.y1, self.x2, self.y2)
    }
}

/// One recognised token from the hOCR document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Trimmed, non-empty word content.
    pub text: String,
    pub bbox: BoundingBox,
    /// Index of the enclosing `ocr_page` element, when the hOCR has page markers.
    pub page: Option<usize>,
    /// `x_wconf` recognition confidence (0-100), when present.
    pub confidence: Option<f32>,
}

impl Word {
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bbox,
            page: None,
            confidence: None,
        }
    }
}

/// Words in document order. Duplicates are legal.
pub type WordSequence = Vec<Word>;

/// An `ocr_page` marker found in the hOCR document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HocrPage {
    /// 0-based page index (`ppageno` when given, otherwise document order).
    pub index: usize,
    /// Page extent in pixels. `None` when the marker had no usable bbox.
    pub bbox: Option<BoundingBox>,
}

/// Why the synthesizer handed back the original PDF untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FallbackReason {
    #[error("no words to overlay")]
    NoWords,

    #[error("original PDF could not be loaded: {0}")]
    UnreadablePdf(String),

    #[error("original PDF has no pages")]
    NoPages,

    #[error("no word could be placed on any page")]
    NothingPlaced,

    #[error("searchable PDF could not be written: {0}")]
    SaveFailed(String),
}

/// Outcome of one conversion, before wire encoding.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub request_id: RequestId,
    /// The searchable PDF, or the original bytes when `fallback` is set.
    pub pdf: Vec<u8>,
    pub words_extracted: usize,
    /// Words drawn into the text layer.
    pub words_placed: usize,
    /// Words parsed but not drawn (unencodable text, page out of range).
    pub words_skipped: usize,
    /// First characters of all word texts joined by single spaces.
    pub extracted_text: Option<String>,
    pub fallback: Option<FallbackReason>,
    pub processing_time: Duration,
}

impl ConversionResult {
    /// True when the returned PDF carries a text layer.
    pub fn is_searchable(&self) -> bool {
        self.fallback.is_none()
    }
}

/// Body of `POST /convert`.
///
/// Both fields are optional at the serde level so a missing one is reported
/// as a client error instead of a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    #[serde(default)]
    pub hocr: Option<String>,
    /// Base64-encoded original PDF.
    #[serde(default)]
    pub original_pdf: Option<String>,
}

/// Body returned by `POST /convert`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searchable_pdf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words_extracted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processing_time_ms: u64,
}

impl ConversionResponse {
    /// A failure record with the given caller-facing message.
    pub fn failure(error: impl Into<String>, processing_time: Duration) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            processing_time_ms: duration_ms(processing_time),
            ..Self::default()
        }
    }
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn healthy(version: &str) -> Self {
        Self {
            status: "healthy".into(),
            service: "hOCR to PDF converter".into(),
            version: version.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Whole milliseconds, saturating.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
