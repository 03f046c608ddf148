// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hOCR module — structural scanning of OCR markup into positioned words.

pub mod parser;
pub mod title;

pub use parser::{HocrParser, ParseOutcome, parse_hocr};
