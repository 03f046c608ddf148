// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page assignment and hOCR → PDF coordinate mapping.
//
// hOCR boxes have a top-left origin with y growing downward; PDF user space
// has a bottom-left origin with y growing upward. A word's baseline is placed
// on the bottom edge of its box:
//
//   pdf_x = x1
//   pdf_y = page_height - y2
//
// Two page models are supported:
//
// - Flat: the hOCR has no page markers and all words live in one coordinate
//   space made of stacked pages of `page_height` units. A word belongs to page
//   `floor(y1 / page_height)` and its y is taken relative to that page's top.
// - Marked: words carry the index of their `ocr_page`, whose bbox gives the
//   pixel extent of that page. Coordinates are scaled from pixels onto the
//   PDF page's displayed size.

use std::collections::{BTreeMap, HashMap};

use ocrlayer_core::{BoundingBox, HocrPage, Word};

use super::reader::PageGeometry;

/// Page index for a word under the flat model.
pub fn assign_page(bbox: &BoundingBox, page_height: f32) -> usize {
    if !(page_height.is_finite() && page_height > 0.0) {
        return 0;
    }
    (bbox.y1 as f32 / page_height).floor() as usize
}

/// Which page model a document uses.
#[derive(Debug, Clone)]
pub enum PageModel {
    Flat { page_height: f32 },
    Marked {
        /// Pixel extent of each `ocr_page`, keyed by page index.
        extents: HashMap<usize, BoundingBox>,
        /// Used for words that sit outside every `ocr_page`.
        page_height: f32,
    },
}

impl PageModel {
    /// Pick the marked model when any word carries a page index.
    pub fn for_words(words: &[Word], pages: &[HocrPage], page_height: f32) -> Self {
        if pages.is_empty() || words.iter().all(|w| w.page.is_none()) {
            return Self::Flat { page_height };
        }
        let extents = pages
            .iter()
            .filter_map(|page| page.bbox.map(|bbox| (page.index, bbox)))
            .filter(|(_, bbox)| !bbox.is_degenerate())
            .collect();
        Self::Marked {
            extents,
            page_height,
        }
    }

    /// 0-based page index of a word.
    pub fn page_of(&self, word: &Word) -> usize {
        match self {
            Self::Flat { page_height } => assign_page(&word.bbox, *page_height),
            Self::Marked { page_height, .. } => word
                .page
                .unwrap_or_else(|| assign_page(&word.bbox, *page_height)),
        }
    }

    /// Group words by page index, keeping document order within each page.
    pub fn group<'w>(&self, words: &'w [Word]) -> BTreeMap<usize, Vec<&'w Word>> {
        let mut groups: BTreeMap<usize, Vec<&'w Word>> = BTreeMap::new();
        for word in words {
            groups.entry(self.page_of(word)).or_default().push(word);
        }
        groups
    }

    /// Position of a word on its PDF page.
    pub fn place(&self, word: &Word, page_index: usize, geometry: &PageGeometry) -> Placement {
        let bbox = &word.bbox;

        let marked_extent = match (self, word.page) {
            (Self::Marked { extents, .. }, Some(page)) => extents.get(&page),
            _ => None,
        };

        let (u, v, width, height) = match (self, marked_extent) {
            (Self::Flat { page_height }, _) | (Self::Marked { page_height, .. }, None) => {
                let page_height = *page_height;
                // Only y-derived page indices sit in the stacked coordinate
                // space; a marker-assigned word is already page-relative.
                let top = match (self, word.page) {
                    (Self::Marked { .. }, Some(_)) => 0.0,
                    _ => page_index as f32 * page_height,
                };
                let y2 = bbox.y2 as f32 - top;
                (
                    bbox.x1 as f32,
                    page_height - y2,
                    bbox.width() as f32,
                    bbox.height() as f32,
                )
            }
            (Self::Marked { .. }, Some(extent)) => {
                let (page_w, page_h) = geometry.displayed_size();
                let sx = page_w / extent.width() as f32;
                let sy = page_h / extent.height() as f32;
                let x1 = bbox.x1.saturating_sub(extent.x1) as f32 * sx;
                let y2 = bbox.y2.saturating_sub(extent.y1) as f32 * sy;
                (
                    x1,
                    page_h - y2,
                    bbox.width() as f32 * sx,
                    bbox.height() as f32 * sy,
                )
            }
        };

        let (x, y) = geometry.to_user_space(u, v);
        Placement {
            x,
            y,
            width,
            height,
        }
    }
}

/// Baseline origin and box size of a word in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    /// Box width along the displayed horizontal, in points.
    pub width: f32,
    pub height: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(x1: u32, y1: u32, x2: u32, y2: u32) -> Word {
        Word::new("w", BoundingBox::new(x1, y1, x2, y2).unwrap())
    }

    fn letter() -> PageGeometry {
        PageGeometry {
            media_box: [0.0, 0.0, 612.0, 792.0],
            rotation: 0,
        }
    }

    #[test]
    fn flat_assignment_uses_page_height() {
        assert_eq!(assign_page(&word(0, 100, 10, 120).bbox, 792.0), 0);
        assert_eq!(assign_page(&word(0, 900, 10, 920).bbox, 792.0), 1);
        assert_eq!(assign_page(&word(0, 792, 10, 800).bbox, 792.0), 1);
        assert_eq!(assign_page(&word(0, 791, 10, 800).bbox, 792.0), 0);
    }

    #[test]
    fn flat_assignment_is_deterministic() {
        let words = vec![word(0, 10, 1, 20), word(0, 1600, 1, 1610), word(0, 20, 1, 30)];
        let model = PageModel::for_words(&words, &[], 792.0);
        let first = model.group(&words);
        let second = model.group(&words);
        assert_eq!(first.keys().collect::<Vec<_>>(), [&0, &2]);
        assert_eq!(first[&0].len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn baseline_sits_on_box_bottom() {
        let w = word(10, 20, 50, 40);
        let placement = PageModel::Flat { page_height: 792.0 }.place(&w, 0, &letter());
        assert_eq!(placement.x, 10.0);
        assert_eq!(placement.y, 792.0 - 40.0);
        assert_eq!(placement.width, 40.0);
        assert_eq!(placement.height, 20.0);
    }

    #[test]
    fn later_flat_pages_are_relative_to_their_top() {
        let w = word(10, 900, 50, 940);
        let placement = PageModel::Flat { page_height: 792.0 }.place(&w, 1, &letter());
        assert_eq!(placement.y, 792.0 - (940.0 - 792.0));
    }

    #[test]
    fn degenerate_boxes_place_without_panicking() {
        let w = word(5, 5, 5, 5);
        let placement = PageModel::Flat { page_height: 792.0 }.place(&w, 0, &letter());
        assert_eq!(placement.width, 0.0);
        assert!(placement.y.is_finite());
    }

    #[test]
    fn marked_pages_scale_pixels_to_points() {
        // 300 dpi scan of a Letter page.
        let pages = vec![HocrPage {
            index: 0,
            bbox: BoundingBox::new(0, 0, 2550, 3300),
        }];
        let mut w = word(300, 300, 600, 600);
        w.page = Some(0);
        let model = PageModel::for_words(std::slice::from_ref(&w), &pages, 792.0);
        assert!(matches!(model, PageModel::Marked { .. }));

        let placement = model.place(&w, model.page_of(&w), &letter());
        assert!((placement.x - 72.0).abs() < 0.01);
        assert!((placement.y - (792.0 - 144.0)).abs() < 0.01);
        assert!((placement.width - 72.0).abs() < 0.01);
    }

    #[test]
    fn marked_model_uses_word_page_over_y() {
        let pages = vec![
            HocrPage {
                index: 0,
                bbox: BoundingBox::new(0, 0, 612, 792),
            },
            HocrPage {
                index: 1,
                bbox: BoundingBox::new(0, 0, 612, 792),
            },
        ];
        let mut w = word(10, 10, 20, 20);
        w.page = Some(1);
        let model = PageModel::for_words(std::slice::from_ref(&w), &pages, 792.0);
        assert_eq!(model.page_of(&w), 1);
    }

    #[test]
    fn marked_pages_without_extent_are_page_relative() {
        let pages = vec![
            HocrPage { index: 0, bbox: None },
            HocrPage { index: 1, bbox: None },
        ];
        let mut first = word(10, 20, 50, 40);
        first.page = Some(0);
        let mut second = word(10, 20, 50, 40);
        second.page = Some(1);
        let words = vec![first, second];
        let model = PageModel::for_words(&words, &pages, 792.0);

        for w in &words {
            let placement = model.place(w, model.page_of(w), &letter());
            assert_eq!(placement.y, 792.0 - 40.0);
        }
    }

    #[test]
    fn rotated_pages_map_through_rotation() {
        let rotated = PageGeometry {
            media_box: [0.0, 0.0, 612.0, 792.0],
            rotation: 90,
        };
        let w = word(0, 0, 10, 10);
        let placement = PageModel::Flat { page_height: 612.0 }.place(&w, 0, &rotated);
        // Displayed (0, 602) with 90° rotation lands at user (612 - 602, 0).
        assert_eq!((placement.x, placement.y), (10.0, 0.0));
    }
}
