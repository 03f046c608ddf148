// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diagnostic events and the sinks that receive them.
//
// Each component takes a `&dyn DiagnosticSink` instead of logging through a
// process-wide logger. The server passes a `TracingSink`; tests pass a
// `MemorySink` and assert on the recorded events.

use std::sync::Mutex;

use tracing::{debug, error, info, warn};

use crate::types::{BoundingBox, FallbackReason, RequestId};

/// A single event emitted by the parse or overlay stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A conversion request entered the core.
    RequestStarted {
        request_id: RequestId,
        hocr_chars: usize,
        pdf_bytes: usize,
    },
    /// Sampled word from the parser (first few, then every Nth).
    WordSampled {
        index: usize,
        text: String,
        bbox: BoundingBox,
    },
    /// A word element was found but dropped.
    WordSkipped { reason: String },
    /// The markup could not be scanned at all; the parse result is empty.
    ParseFailed { detail: String },
    /// Summary of the parse stage.
    ParseFinished {
        words: usize,
        skipped: usize,
        pages: usize,
    },
    /// A parsed word was not drawn into the text layer.
    WordNotPlaced { text: String, reason: String },
    /// Text layer appended to one PDF page (1-indexed page number).
    PageOverlaid { page_number: u32, words: usize },
    /// The original PDF was passed through unchanged.
    Fallback { reason: FallbackReason },
    /// The request left the core.
    RequestFinished {
        request_id: RequestId,
        words: usize,
        elapsed_ms: u64,
    },
}

/// Receiver for [`Diagnostic`] events.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: Diagnostic);
}

/// Forwards events to `tracing` at a level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: Diagnostic) {
        match event {
            Diagnostic::RequestStarted {
                request_id,
                hocr_chars,
                pdf_bytes,
            } => info!(%request_id, hocr_chars, pdf_bytes, "Conversion started"),
            Diagnostic::WordSampled { index, text, bbox } => {
                debug!(index, %text, %bbox, "Parsed word")
            }
            Diagnostic::WordSkipped { reason } => debug!(%reason, "Skipped hOCR word element"),
            Diagnostic::ParseFailed { detail } => error!(%detail, "Error parsing hOCR"),
            Diagnostic::ParseFinished {
                words,
                skipped,
                pages,
            } => info!(words, skipped, pages, "Extracted words from hOCR"),
            Diagnostic::WordNotPlaced { text, reason } => {
                warn!(%text, %reason, "Word left out of text layer")
            }
            Diagnostic::PageOverlaid { page_number, words } => {
                debug!(page_number, words, "Text layer appended to page")
            }
            Diagnostic::Fallback { reason } => {
                warn!(%reason, "Returning original PDF without text layer")
            }
            Diagnostic::RequestFinished {
                request_id,
                words,
                elapsed_ms,
            } => info!(%request_id, words, elapsed_ms, "Conversion finished"),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: Diagnostic) {}
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Diagnostic> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, event: Diagnostic) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.record(Diagnostic::WordSkipped {
            reason: "first".into(),
        });
        sink.record(Diagnostic::Fallback {
            reason: FallbackReason::NoWords,
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Diagnostic::WordSkipped { .. }));
        assert_eq!(
            events[1],
            Diagnostic::Fallback {
                reason: FallbackReason::NoWords
            }
        );
    }

    #[test]
    fn sinks_are_object_safe() {
        let sinks: Vec<Box<dyn DiagnosticSink>> =
            vec![Box::new(NullSink), Box::new(TracingSink), Box::new(MemorySink::new())];
        for sink in &sinks {
            sink.record(Diagnostic::ParseFinished {
                words: 0,
                skipped: 0,
                pages: 0,
            });
        }
    }
}
