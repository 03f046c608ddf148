// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hOCR `title` property parsing.
//
// hOCR packs element properties into the title attribute as `;`-separated
// `keyword value...` pairs, e.g. `bbox 36 92 96 116; x_wconf 95`. Keywords are
// matched case-insensitively since producers disagree on casing.

use ocrlayer_core::BoundingBox;

/// Properties of interest pulled from one `title` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleProperties {
    /// `Some(Err(..))` when a bbox property exists but is malformed.
    pub bbox: Option<Result<BoundingBox, String>>,
    pub x_wconf: Option<f32>,
    pub ppageno: Option<usize>,
}

impl TitleProperties {
    pub fn parse(title: &str) -> Self {
        let mut props = Self::default();

        for property in title.split(';') {
            let mut fields = property.split_whitespace();
            let Some(keyword) = fields.next() else {
                continue;
            };
            let values: Vec<&str> = fields.collect();

            if keyword.eq_ignore_ascii_case("bbox") {
                // First bbox wins; later duplicates are ignored.
                if props.bbox.is_none() {
                    props.bbox = Some(parse_bbox(&values));
                }
            } else if keyword.eq_ignore_ascii_case("x_wconf") {
                props.x_wconf = values.first().and_then(|v| v.parse::<f32>().ok());
            } else if keyword.eq_ignore_ascii_case("ppageno") {
                props.ppageno = values.first().and_then(|v| v.parse::<usize>().ok());
            }
        }

        props
    }
}

fn parse_bbox(values: &[&str]) -> Result<BoundingBox, String> {
    if values.len() != 4 {
        return Err(format!("bbox needs 4 coordinates, found {}", values.len()));
    }

    let mut coords = [0u32; 4];
    for (slot, raw) in coords.iter_mut().zip(values) {
        *slot = raw
            .parse::<u32>()
            .map_err(|_| format!("bbox coordinate {raw:?} is not a non-negative integer"))?;
    }

    let [x1, y1, x2, y2] = coords;
    BoundingBox::new(x1, y1, x2, y2)
        .ok_or_else(|| format!("bbox {x1} {y1} {x2} {y2} has inverted corners"))
}
