// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP routes.
//
// Endpoints:
// - GET  /health  - liveness probe
// - POST /convert - hOCR + base64 PDF in, base64 searchable PDF out

use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ocrlayer_core::error::OcrLayerError;
use ocrlayer_core::human_errors::{Fault, public_error};
use ocrlayer_core::{ConversionRequest, ConversionResponse, HealthStatus, TracingSink};
use ocrlayer_document::into_response;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::state::AppState;

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_payload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/convert", post(convert))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::healthy(env!("CARGO_PKG_VERSION")))
}

async fn convert(
    State(state): State<AppState>,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> (StatusCode, Json<ConversionResponse>) {
    let started = Instant::now();

    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return reject(rejection, started.elapsed()),
    };

    let converter = state.converter.clone();
    let joined = tokio::task::spawn_blocking(move || {
        converter
            .convert_request(&request, &TracingSink)
            .map(|result| into_response(&result))
    })
    .await;

    let outcome = joined.unwrap_or_else(|join_err| {
        Err(OcrLayerError::Internal(format!(
            "conversion task failed: {join_err}"
        )))
    });

    match outcome {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(err) => failure(&err, started.elapsed()),
    }
}

fn failure(err: &OcrLayerError, elapsed: Duration) -> (StatusCode, Json<ConversionResponse>) {
    let public = public_error(err);
    let status = match public.fault {
        Fault::Client => {
            warn!(error = %err, "Conversion request rejected");
            StatusCode::BAD_REQUEST
        }
        Fault::Service => {
            error!(error = %err, "Conversion failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ConversionResponse::failure(public.message, elapsed)))
}

fn reject(rejection: JsonRejection, elapsed: Duration) -> (StatusCode, Json<ConversionResponse>) {
    let status = rejection.status();
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "Request body exceeds the payload limit".to_string()
    } else {
        format!("Invalid request body: {}", rejection.body_text())
    };
    warn!(%status, detail = %rejection.body_text(), "Request body rejected");
    (status, Json(ConversionResponse::failure(message, elapsed)))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use lopdf::{Document, Object, Stream, dictionary};
    use ocrlayer_core::ServiceConfig;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    const HELLO: &str = r#"<div class="ocr_page"><span class="ocrx_word" title="bbox 10 20 50 40">Hello</span></div>"#;

    fn blank_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 1 1 l S".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {},
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn app() -> Router {
        router(AppState::new(ServiceConfig::default()))
    }

    fn post_json(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/convert")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_service() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "hOCR to PDF converter");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn convert_returns_searchable_pdf() {
        let pdf = blank_pdf();
        let body = json!({ "hocr": HELLO, "originalPdf": STANDARD.encode(&pdf) }).to_string();
        let (status, body) = send(app(), post_json(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["wordsExtracted"], 1);
        assert!(body["extractedText"].as_str().unwrap().contains("Hello"));
        assert!(body["processingTimeMs"].is_u64());
        assert!(body.get("fallback").is_none());

        let searchable = STANDARD
            .decode(body["searchablePdf"].as_str().unwrap())
            .unwrap();
        let doc = Document::load_mem(&searchable).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(doc.extract_text(&[1]).unwrap().contains("Hello"));
    }

    #[tokio::test]
    async fn missing_pdf_is_a_bad_request() {
        let body = json!({ "hocr": HELLO }).to_string();
        let (status, body) = send(app(), post_json(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing hocr or originalPdf data");
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let (status, body) = send(app(), post_json("{not json".into())).await;
        assert!(status.is_client_error());
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn non_pdf_payload_is_a_bad_request() {
        let body = json!({ "hocr": HELLO, "originalPdf": STANDARD.encode(b"<html/>") }).to_string();
        let (status, body) = send(app(), post_json(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn zero_words_returns_original_pdf() {
        let pdf = blank_pdf();
        let body = json!({ "hocr": "<html><body></body></html>", "originalPdf": STANDARD.encode(&pdf) })
            .to_string();
        let (status, body) = send(app(), post_json(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["wordsExtracted"], 0);
        assert_eq!(
            STANDARD.decode(body["searchablePdf"].as_str().unwrap()).unwrap(),
            pdf
        );
        assert!(body["fallback"].is_string());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let config = ServiceConfig {
            max_payload_bytes: 1024,
            ..ServiceConfig::default()
        };
        let app = router(AppState::new(config));
        let body = json!({ "hocr": "x".repeat(4096), "originalPdf": "" }).to_string();
        let (status, body) = send(app, post_json(body)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["success"], false);
    }
}
