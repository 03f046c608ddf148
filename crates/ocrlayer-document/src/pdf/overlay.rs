// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay synthesizer — composite an invisible text layer onto the pages of
// an existing PDF using `lopdf`.
//
// The original page content is never rewritten. Each touched page gets two
// extra content streams around its existing ones:
//
//   Contents = [ "q", <original streams...>, "Q q /GSOcr gs BT ... ET Q" ]
//
// so whatever graphics state the original leaves behind is popped before the
// text layer is drawn. Words are shown with text render mode 3 (invisible)
// and an ExtGState with zero fill/stroke alpha, in standard-14 Helvetica.
//
// Any failure that prevents a searchable result degrades to handing back the
// original bytes; the caller sees that as `Synthesis::Passthrough`.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use ocrlayer_core::{
    Diagnostic, DiagnosticSink, FallbackReason, HocrPage, OverlayConfig, Word,
};
use tracing::{debug, info, instrument};

use super::encoding::{encode_win_ansi, helvetica_width};
use super::placement::PageModel;
use super::reader::{PageGeometry, inherited_attribute, page_geometry};

/// Resource name of the text-layer font (suffixed if already taken).
const FONT_RESOURCE: &str = "FOcr";

/// Resource name of the zero-alpha graphics state.
const STATE_RESOURCE: &str = "GSOcr";

/// `Tr` mode that neither fills nor strokes glyphs.
const INVISIBLE_RENDER_MODE: i64 = 3;

/// Bounds for the `Tz` horizontal scaling percentage.
const MIN_HORIZONTAL_SCALE: f32 = 1.0;
const MAX_HORIZONTAL_SCALE: f32 = 1000.0;

/// Counters for a successful overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayReport {
    pub pages_overlaid: usize,
    pub words_placed: usize,
    pub words_skipped: usize,
}

/// Result of [`OverlaySynthesizer::synthesize`].
#[derive(Debug, Clone)]
pub enum Synthesis {
    /// A new PDF carrying the text layer.
    Overlaid { pdf: Vec<u8>, report: OverlayReport },
    /// The original bytes, unchanged.
    Passthrough { pdf: Vec<u8>, reason: FallbackReason },
}

impl Synthesis {
    pub fn pdf(&self) -> &[u8] {
        match self {
            Self::Overlaid { pdf, .. } | Self::Passthrough { pdf, .. } => pdf,
        }
    }

    pub fn into_pdf(self) -> Vec<u8> {
        match self {
            Self::Overlaid { pdf, .. } | Self::Passthrough { pdf, .. } => pdf,
        }
    }

    pub fn fallback(&self) -> Option<&FallbackReason> {
        match self {
            Self::Overlaid { .. } => None,
            Self::Passthrough { reason, .. } => Some(reason),
        }
    }

    pub fn report(&self) -> Option<&OverlayReport> {
        match self {
            Self::Overlaid { report, .. } => Some(report),
            Self::Passthrough { .. } => None,
        }
    }
}

/// Adds invisible, positioned text to existing PDF pages.
pub struct OverlaySynthesizer<'a> {
    config: OverlayConfig,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> OverlaySynthesizer<'a> {
    pub fn new(config: OverlayConfig, sink: &'a dyn DiagnosticSink) -> Self {
        Self { config, sink }
    }

    /// Overlay `words` onto `original`.
    ///
    /// `pages` are the `ocr_page` markers from the parser; pass an empty slice
    /// to use the flat page-height model.
    #[instrument(skip_all, fields(pdf_len = original.len(), words = words.len()))]
    pub fn synthesize(&self, original: &[u8], words: &[Word], pages: &[HocrPage]) -> Synthesis {
        if words.is_empty() {
            return self.passthrough(original, FallbackReason::NoWords);
        }

        let mut doc = match Document::load_mem(original) {
            Ok(doc) => doc,
            Err(err) => {
                return self.passthrough(original, FallbackReason::UnreadablePdf(err.to_string()));
            }
        };
        if doc.is_encrypted() {
            return self.passthrough(
                original,
                FallbackReason::UnreadablePdf("document is encrypted".into()),
            );
        }

        let report = match self.overlay_document(&mut doc, words, pages) {
            Ok(report) => report,
            Err(reason) => return self.passthrough(original, reason),
        };

        let mut output = Vec::new();
        if let Err(err) = doc.save_to(&mut output) {
            return self.passthrough(original, FallbackReason::SaveFailed(err.to_string()));
        }

        info!(
            pages = report.pages_overlaid,
            placed = report.words_placed,
            skipped = report.words_skipped,
            output_bytes = output.len(),
            "Text layer composited"
        );

        Synthesis::Overlaid {
            pdf: output,
            report,
        }
    }

    fn passthrough(&self, original: &[u8], reason: FallbackReason) -> Synthesis {
        self.sink.record(Diagnostic::Fallback {
            reason: reason.clone(),
        });
        Synthesis::Passthrough {
            pdf: original.to_vec(),
            reason,
        }
    }

    fn not_placed(&self, word: &Word, reason: impl Into<String>) {
        self.sink.record(Diagnostic::WordNotPlaced {
            text: word.text.clone(),
            reason: reason.into(),
        });
    }

    fn overlay_document(
        &self,
        doc: &mut Document,
        words: &[Word],
        hocr_pages: &[HocrPage],
    ) -> Result<OverlayReport, FallbackReason> {
        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(FallbackReason::NoPages);
        }

        let model = PageModel::for_words(words, hocr_pages, self.config.page_height);
        let groups = model.group(words);
        debug!(model = ?model, groups = groups.len(), "Words grouped by page");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let state_id = doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(0.0),
            "CA" => Object::Real(0.0),
        });

        let mut report = OverlayReport::default();

        for (page_index, page_words) in groups {
            // 1-based page number; hOCR page indices are unbounded.
            let located = page_index
                .checked_add(1)
                .and_then(|number| u32::try_from(number).ok())
                .and_then(|number| page_ids.get(&number).map(|&id| (number, id)));
            let Some((page_number, page_id)) = located else {
                for word in &page_words {
                    self.not_placed(
                        word,
                        format!(
                            "page index {} is beyond the document's {} pages",
                            page_index,
                            page_ids.len()
                        ),
                    );
                }
                report.words_skipped += page_words.len();
                continue;
            };

            let geometry = page_geometry(doc, page_id);
            let (operations, placed) =
                self.word_operations(&model, page_index, &geometry, &page_words);
            report.words_skipped += page_words.len() - placed.len();
            if placed.is_empty() {
                continue;
            }

            let layer = TextLayer {
                font_id,
                state_id,
                font_size: self.config.font_size,
            };
            if let Err(detail) = attach_text_layer(doc, page_id, &layer, operations) {
                for word in &placed {
                    self.not_placed(word, format!("page {page_number}: {detail}"));
                }
                report.words_skipped += placed.len();
                continue;
            }

            self.sink.record(Diagnostic::PageOverlaid {
                page_number,
                words: placed.len(),
            });
            report.pages_overlaid += 1;
            report.words_placed += placed.len();
        }

        if report.words_placed == 0 {
            return Err(FallbackReason::NothingPlaced);
        }
        Ok(report)
    }

    /// Text-showing operations for one page, plus the words they draw.
    fn word_operations<'w>(
        &self,
        model: &PageModel,
        page_index: usize,
        geometry: &PageGeometry,
        words: &[&'w Word],
    ) -> (Vec<Operation>, Vec<&'w Word>) {
        let font_size = self.config.font_size;
        let [a, b, c, d] = geometry.text_direction();

        let mut operations = Vec::with_capacity(words.len() * 3);
        let mut placed = Vec::with_capacity(words.len());

        for &word in words {
            let Some(bytes) = encode_win_ansi(&word.text) else {
                self.not_placed(word, "text has characters outside WinAnsiEncoding");
                continue;
            };

            let placement = model.place(word, page_index, geometry);
            if !(placement.x.is_finite() && placement.y.is_finite()) {
                self.not_placed(word, "position is not a finite number");
                continue;
            }

            let scale = if self.config.stretch_to_box {
                horizontal_scale(placement.width, helvetica_width(&bytes, font_size))
            } else {
                100.0
            };

            operations.push(Operation::new("Tz", vec![Object::Real(scale)]));
            operations.push(Operation::new(
                "Tm",
                vec![
                    Object::Real(a),
                    Object::Real(b),
                    Object::Real(c),
                    Object::Real(d),
                    Object::Real(placement.x),
                    Object::Real(placement.y),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(bytes, StringFormat::Hexadecimal)],
            ));
            placed.push(word);
        }

        (operations, placed)
    }
}

/// `Tz` percentage that stretches text of `natural` width to `target`.
fn horizontal_scale(target: f32, natural: f32) -> f32 {
    if natural <= 0.0 || !target.is_finite() {
        return 100.0;
    }
    (target / natural * 100.0).clamp(MIN_HORIZONTAL_SCALE, MAX_HORIZONTAL_SCALE)
}

// -- Page surgery -------------------------------------------------------------

/// Where a page's Resources dictionary lives.
#[derive(Debug, Clone, Copy)]
enum ResourceTarget {
    /// Inline in the page dictionary.
    Inline(ObjectId),
    /// A separate (possibly shared) dictionary object.
    Indirect(ObjectId),
}

/// Shared objects every overlaid page refers to.
struct TextLayer {
    font_id: ObjectId,
    state_id: ObjectId,
    font_size: f32,
}

fn attach_text_layer(
    doc: &mut Document,
    page_id: ObjectId,
    layer: &TextLayer,
    word_operations: Vec<Operation>,
) -> Result<(), String> {
    let target = locate_resources(doc, page_id)?;
    let font_name = register_resource(doc, target, b"Font", FONT_RESOURCE, layer.font_id)?;
    let state_name =
        register_resource(doc, target, b"ExtGState", STATE_RESOURCE, layer.state_id)?;

    let mut operations = Vec::with_capacity(word_operations.len() + 8);
    operations.push(Operation::new("Q", vec![]));
    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new("gs", vec![Object::Name(state_name)]));
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec![Object::Name(font_name), Object::Real(layer.font_size)],
    ));
    operations.push(Operation::new("Tr", vec![Object::Integer(INVISIBLE_RENDER_MODE)]));
    operations.extend(word_operations);
    operations.push(Operation::new("ET", vec![]));
    operations.push(Operation::new("Q", vec![]));

    let encoded = Content { operations }
        .encode()
        .map_err(|err| format!("failed to encode text layer: {err}"))?;

    // Leading newline keeps the first operator apart from whatever the
    // previous stream ended with once viewers concatenate them.
    let mut overlay = Vec::with_capacity(encoded.len() + 1);
    overlay.push(b'\n');
    overlay.extend(encoded);

    append_content(doc, page_id, overlay)
}

fn locate_resources(doc: &mut Document, page_id: ObjectId) -> Result<ResourceTarget, String> {
    let own = doc
        .get_dictionary(page_id)
        .map_err(|err| format!("cannot read page object {page_id:?}: {err}"))?
        .get(b"Resources")
        .ok()
        .cloned();

    match own {
        Some(Object::Dictionary(_)) => Ok(ResourceTarget::Inline(page_id)),
        Some(Object::Reference(id)) => Ok(ResourceTarget::Indirect(id)),
        _ => {
            let inherited = inherited_attribute(doc, page_id, b"Resources").cloned();
            match inherited {
                Some(Object::Reference(id)) => Ok(ResourceTarget::Indirect(id)),
                other => {
                    // Copy inline inherited resources down so additions stay
                    // local to this page.
                    let copied = match other {
                        Some(Object::Dictionary(dict)) => dict,
                        _ => Dictionary::new(),
                    };
                    doc.get_dictionary_mut(page_id)
                        .map_err(|err| format!("cannot update page object {page_id:?}: {err}"))?
                        .set("Resources", Object::Dictionary(copied));
                    Ok(ResourceTarget::Inline(page_id))
                }
            }
        }
    }
}

fn resources(doc: &Document, target: ResourceTarget) -> Result<&Dictionary, String> {
    match target {
        ResourceTarget::Inline(page_id) => doc
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Resources"))
            .and_then(Object::as_dict),
        ResourceTarget::Indirect(id) => doc.get_dictionary(id),
    }
    .map_err(|err| format!("cannot read Resources: {err}"))
}

fn resources_mut(doc: &mut Document, target: ResourceTarget) -> Result<&mut Dictionary, String> {
    match target {
        ResourceTarget::Inline(page_id) => doc
            .get_dictionary_mut(page_id)
            .and_then(|page| page.get_mut(b"Resources"))
            .and_then(Object::as_dict_mut),
        ResourceTarget::Indirect(id) => doc.get_dictionary_mut(id),
    }
    .map_err(|err| format!("cannot update Resources: {err}"))
}

/// Add `object_id` to the `category` sub-dictionary (Font, ExtGState, ...)
/// under a free name based on `base`, returning the name used.
fn register_resource(
    doc: &mut Document,
    target: ResourceTarget,
    category: &[u8],
    base: &str,
    object_id: ObjectId,
) -> Result<Vec<u8>, String> {
    let entry = resources(doc, target)?.get(category).ok().cloned();

    match entry {
        Some(Object::Reference(category_id)) => {
            let dict = doc
                .get_dictionary_mut(category_id)
                .map_err(|err| format!("cannot update resource dictionary: {err}"))?;
            Ok(insert_unique(dict, base, object_id))
        }
        Some(Object::Dictionary(_)) => {
            let dict = resources_mut(doc, target)?
                .get_mut(category)
                .and_then(Object::as_dict_mut)
                .map_err(|err| format!("cannot update resource dictionary: {err}"))?;
            Ok(insert_unique(dict, base, object_id))
        }
        _ => {
            let mut dict = Dictionary::new();
            dict.set(base, object_id);
            resources_mut(doc, target)?.set(category.to_vec(), Object::Dictionary(dict));
            Ok(base.as_bytes().to_vec())
        }
    }
}

/// Insert a reference under `base`, `base1`, `base2`, ... whichever is free.
/// An existing entry already pointing at `object_id` is reused.
fn insert_unique(dict: &mut Dictionary, base: &str, object_id: ObjectId) -> Vec<u8> {
    let mut name = base.as_bytes().to_vec();
    let mut suffix = 0u32;
    loop {
        match dict.get(&name) {
            Ok(Object::Reference(existing)) if *existing == object_id => return name,
            Ok(_) => {
                suffix += 1;
                name = format!("{base}{suffix}").into_bytes();
            }
            Err(_) => {
                dict.set(name.clone(), object_id);
                return name;
            }
        }
    }
}

/// Wrap the page's existing content in `q ... Q` and append `overlay`.
fn append_content(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> Result<(), String> {
    let existing: Vec<Object> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|err| format!("cannot read page object {page_id:?}: {err}"))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)
        .map_err(|err| format!("cannot update page object {page_id:?}: {err}"))?
        .set("Contents", Object::Array(contents));
    Ok(())
}
