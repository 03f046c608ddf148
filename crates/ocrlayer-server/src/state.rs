// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared application state handed to every request handler.

use std::sync::Arc;

use ocrlayer_core::ServiceConfig;
use ocrlayer_document::Converter;

/// Cheap to clone; requests share the config and converter read-only.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub converter: Arc<Converter>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let converter = Converter::new(config.overlay.clone());
        Self {
            config: Arc::new(config),
            converter: Arc::new(converter),
        }
    }
}
