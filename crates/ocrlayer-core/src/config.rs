// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OcrLayerError, Result};

/// Height of a US Letter page in PDF user-space units.
pub const LETTER_PAGE_HEIGHT: f32 = 792.0;

/// Combined request payload ceiling (50 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Settings that shape the parse and overlay stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Page height used by the flat-y page assignment heuristic and the
    /// legacy coordinate flip.
    pub page_height: f32,
    /// Font size of the invisible text, in points.
    pub font_size: f32,
    /// Stretch each word horizontally (`Tz`) to cover its bounding box.
    pub stretch_to_box: bool,
    /// Maximum characters in the response's text excerpt.
    pub excerpt_chars: usize,
    /// Emit a per-word diagnostic for every Nth word (plus the first few).
    pub word_sample_interval: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            page_height: LETTER_PAGE_HEIGHT,
            font_size: 12.0,
            stretch_to_box: true,
            excerpt_chars: 500,
            word_sample_interval: 50,
        }
    }
}

/// Settings for the HTTP shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Requests larger than this are rejected before the core runs.
    pub max_payload_bytes: usize,
    pub overlay: OverlayConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            overlay: OverlayConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Build a config from process environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("OCRLAYER_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(max) = parse_var(&lookup, "OCRLAYER_MAX_PAYLOAD_BYTES")? {
            config.max_payload_bytes = max;
        }
        if let Some(height) = parse_var::<f32>(&lookup, "OCRLAYER_PAGE_HEIGHT")? {
            if !(height.is_finite() && height > 0.0) {
                return Err(OcrLayerError::Config(format!(
                    "OCRLAYER_PAGE_HEIGHT must be positive, got {height}"
                )));
            }
            config.overlay.page_height = height;
        }
        if let Some(size) = parse_var::<f32>(&lookup, "OCRLAYER_FONT_SIZE")? {
            if !(size.is_finite() && size > 0.0) {
                return Err(OcrLayerError::Config(format!(
                    "OCRLAYER_FONT_SIZE must be positive, got {size}"
                )));
            }
            config.overlay.font_size = size;
        }

        Ok(config)
    }

    /// `host:port` string for binding the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| OcrLayerError::Config(format!("{key}={raw:?}: {err}"))),
    }
}
