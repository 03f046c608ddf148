// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing PDF documents with `lopdf` and inspect page
// geometry and text.

use lopdf::{Dictionary, Document, Object, ObjectId};
use ocrlayer_core::error::OcrLayerError;
use tracing::{debug, instrument};

/// US Letter, the fallback when no MediaBox can be found.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Limit on `/Parent` hops when resolving inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// How far into the file the `%PDF-` header may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Whether `data` carries a PDF header near its start.
///
/// Viewers accept leading junk before the header, so the check only looks for
/// the marker within the first kilobyte.
pub fn looks_like_pdf(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Size and orientation of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// `[llx, lly, urx, ury]` in user space.
    pub media_box: [f32; 4],
    /// Clockwise display rotation, normalised to 0, 90, 180 or 270.
    pub rotation: i32,
}

impl PageGeometry {
    /// Unrotated width in user space.
    pub fn width(&self) -> f32 {
        (self.media_box[2] - self.media_box[0]).abs()
    }

    /// Unrotated height in user space.
    pub fn height(&self) -> f32 {
        (self.media_box[3] - self.media_box[1]).abs()
    }

    /// Width and height as a viewer shows the page.
    pub fn displayed_size(&self) -> (f32, f32) {
        match self.rotation {
            90 | 270 => (self.height(), self.width()),
            _ => (self.width(), self.height()),
        }
    }

    /// Map a point in displayed space (bottom-left origin, y up) to user
    /// space, undoing the page's `/Rotate`.
    pub fn to_user_space(&self, u: f32, v: f32) -> (f32, f32) {
        let (w, h) = (self.width(), self.height());
        let (x, y) = match self.rotation {
            90 => (w - v, u),
            180 => (w - u, h - v),
            270 => (v, h - u),
            _ => (u, v),
        };
        (
            self.media_box[0].min(self.media_box[2]) + x,
            self.media_box[1].min(self.media_box[3]) + y,
        )
    }

    /// Rotation part `[a, b, c, d]` of a text matrix whose x axis runs along
    /// the displayed page's horizontal.
    pub fn text_direction(&self) -> [f32; 4] {
        match self.rotation {
            90 => [0.0, 1.0, -1.0, 0.0],
            180 => [-1.0, 0.0, 0.0, -1.0],
            270 => [0.0, -1.0, 1.0, 0.0],
            _ => [1.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Reads and inspects existing PDF files.
///
/// Wraps `lopdf::Document`; the overlay works on the same document type
/// directly, this wrapper serves callers that only need to look.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, OcrLayerError> {
        let document = Document::load_mem(data).map_err(|err| {
            OcrLayerError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Geometry of a page (1-indexed).
    pub fn page_geometry(&self, page_number: u32) -> Result<PageGeometry, OcrLayerError> {
        let page_id = self.page_id(page_number)?;
        Ok(page_geometry(&self.document, page_id))
    }

    /// Text that a viewer would offer for selection on a page (1-indexed).
    pub fn extract_text(&self, page_number: u32) -> Result<String, OcrLayerError> {
        self.page_id(page_number)?;
        self.document.extract_text(&[page_number]).map_err(|err| {
            OcrLayerError::PdfError(format!(
                "failed to extract text from page {}: {}",
                page_number, err
            ))
        })
    }

    /// Borrow the underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    fn page_id(&self, page_number: u32) -> Result<ObjectId, OcrLayerError> {
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            OcrLayerError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }
}

/// Resolve a page's MediaBox and `/Rotate`, following `/Parent` inheritance.
pub fn page_geometry(doc: &Document, page_id: ObjectId) -> PageGeometry {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| rect_from_object(doc, obj))
        .unwrap_or(DEFAULT_MEDIA_BOX);

    let rotation = inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, obj).as_i64().ok())
        .map(normalise_rotation)
        .unwrap_or(0);

    PageGeometry {
        media_box,
        rotation,
    }
}

/// Look up `key` on the page or the nearest ancestor in the page tree.
pub fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current: &Dictionary = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent_id).ok()?;
    }

    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn rect_from_object(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let arr = resolve(doc, obj).as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }

    let mut rect = [0.0f32; 4];
    for (slot, item) in rect.iter_mut().zip(arr) {
        *slot = match resolve(doc, item) {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r,
            _ => return None,
        };
    }
    Some(rect)
}

fn normalise_rotation(raw: i64) -> i32 {
    match raw.rem_euclid(360) {
        90 => 90,
        180 => 180,
        270 => 270,
        _ => 0,
    }
}
