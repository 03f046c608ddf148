// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion pipeline: hOCR + original PDF → searchable PDF.
//
// Input validation happens here, before any parsing: missing fields, bad
// base64 and non-PDF payloads are client errors. Past that point nothing
// fails the request; parse problems skip words and overlay problems hand
// back the original PDF.

use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ocrlayer_core::error::{OcrLayerError, Result};
use ocrlayer_core::{
    ConversionRequest, ConversionResponse, ConversionResult, Diagnostic, DiagnosticSink,
    OverlayConfig, RequestId, duration_ms,
};
use tracing::{debug, info_span, instrument};

use crate::hocr::HocrParser;
use crate::pdf::overlay::{OverlaySynthesizer, Synthesis};
use crate::pdf::reader::looks_like_pdf;

/// Runs one parse + overlay pass per request.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: OverlayConfig,
}

impl Converter {
    pub fn new(config: OverlayConfig) -> Self {
        Self { config }
    }

    /// Decode a wire request and convert it.
    pub fn convert_request(
        &self,
        request: &ConversionRequest,
        sink: &dyn DiagnosticSink,
    ) -> Result<ConversionResult> {
        let hocr = request
            .hocr
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(OcrLayerError::MissingInput("hocr"))?;
        let encoded = request
            .original_pdf
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(OcrLayerError::MissingInput("originalPdf"))?;

        let original = STANDARD
            .decode(encoded.trim())
            .map_err(|err| OcrLayerError::InvalidEncoding(format!("originalPdf: {err}")))?;

        self.convert(hocr, &original, sink)
    }

    /// Overlay the words of `hocr` onto `original`.
    #[instrument(skip_all, fields(hocr_len = hocr.len(), pdf_len = original.len()))]
    pub fn convert(
        &self,
        hocr: &str,
        original: &[u8],
        sink: &dyn DiagnosticSink,
    ) -> Result<ConversionResult> {
        let started = Instant::now();

        if hocr.is_empty() {
            return Err(OcrLayerError::MissingInput("hocr"));
        }
        if original.is_empty() {
            return Err(OcrLayerError::MissingInput("originalPdf"));
        }
        if !looks_like_pdf(original) {
            return Err(OcrLayerError::InvalidPdf(
                "no %PDF- header near the start of the data".into(),
            ));
        }

        let request_id = RequestId::new();
        let _span = info_span!("conversion", %request_id).entered();
        sink.record(Diagnostic::RequestStarted {
            request_id,
            hocr_chars: hocr.chars().count(),
            pdf_bytes: original.len(),
        });

        let outcome = HocrParser::new(sink)
            .with_sample_interval(self.config.word_sample_interval)
            .parse(hocr);
        let words_extracted = outcome.words.len();
        let extracted_text =
            (words_extracted > 0).then(|| outcome.excerpt(self.config.excerpt_chars));

        let synthesis = OverlaySynthesizer::new(self.config.clone(), sink).synthesize(
            original,
            &outcome.words,
            &outcome.pages,
        );

        let (pdf, words_placed, words_skipped, fallback) = match synthesis {
            Synthesis::Overlaid { pdf, report } => {
                (pdf, report.words_placed, report.words_skipped, None)
            }
            Synthesis::Passthrough { pdf, reason } => (pdf, 0, words_extracted, Some(reason)),
        };

        let processing_time = started.elapsed();
        sink.record(Diagnostic::RequestFinished {
            request_id,
            words: words_extracted,
            elapsed_ms: duration_ms(processing_time),
        });

        debug!(
            placed = words_placed,
            skipped = words_skipped,
            searchable = fallback.is_none(),
            "Overlay outcome"
        );

        Ok(ConversionResult {
            request_id,
            pdf,
            words_extracted,
            words_placed,
            words_skipped,
            extracted_text,
            fallback,
            processing_time,
        })
    }
}

/// Wire form of a finished conversion.
pub fn into_response(result: &ConversionResult) -> ConversionResponse {
    ConversionResponse {
        success: true,
        searchable_pdf: Some(STANDARD.encode(&result.pdf)),
        words_extracted: Some(result.words_extracted),
        extracted_text: result.extracted_text.clone(),
        message: Some(format!(
            "hOCR processed successfully - {} words extracted",
            result.words_extracted
        )),
        fallback: result.fallback.as_ref().map(ToString::to_string),
        error: None,
        processing_time_ms: duration_ms(result.processing_time),
    }
}
