// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hOCR parser — streams markup through `lol_html` and collects `ocrx_word`
// elements with their bounding boxes.
//
// The scan is structural: elements and attributes are read from the HTML
// tokenizer, so attribute order, quoting style, extra classes and child tags
// inside a word do not matter. Word text is accumulated from the text chunks
// seen between a word's start tag and its end tag.
//
// A malformed word element (bad bbox, empty text, no end tag) is skipped and
// counted; the rest of the document is still parsed. Parsing never fails the
// caller. If the tokenizer itself errors out, the outcome is empty and
// carries a diagnostic.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::html_content::{Element, EndTag};
use lol_html::{HandlerResult, HtmlRewriter, Settings, doc_text, element};
use ocrlayer_core::{
    BoundingBox, Diagnostic, DiagnosticSink, HocrPage, NullSink, Word, WordSequence,
};
use tracing::instrument;

use super::title::TitleProperties;

/// Class token of word-level hOCR elements.
pub const WORD_CLASS: &str = "ocrx_word";

/// Class token of page-level hOCR elements.
pub const PAGE_CLASS: &str = "ocr_page";

/// Number of leading words always sampled into diagnostics.
const SAMPLE_HEAD: usize = 3;

/// Result of scanning one hOCR document.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Words in document order.
    pub words: WordSequence,
    /// `ocr_page` markers in document order.
    pub pages: Vec<HocrPage>,
    /// Word elements found but dropped.
    pub skipped: usize,
    /// Set when the markup could not be scanned at all.
    pub diagnostic: Option<String>,
}

impl ParseOutcome {
    /// All word texts joined by single spaces, cut to `max_chars` characters.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let joined = self
            .words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        match joined.char_indices().nth(max_chars) {
            Some((cut, _)) => joined[..cut].to_string(),
            None => joined,
        }
    }
}

/// Scans hOCR markup into words.
pub struct HocrParser<'a> {
    sink: &'a dyn DiagnosticSink,
    sample_interval: usize,
}

impl<'a> HocrParser<'a> {
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            sink,
            sample_interval: 50,
        }
    }

    /// Emit a `WordSampled` event for every `interval`th word (0 disables
    /// sampling beyond the first few words).
    pub fn with_sample_interval(mut self, interval: usize) -> Self {
        self.sample_interval = interval;
        self
    }

    #[instrument(skip_all, fields(markup_len = markup.len()))]
    pub fn parse(&self, markup: &str) -> ParseOutcome {
        let state = Rc::new(RefCell::new(ScanState::default()));

        if let Err(detail) = scan(markup, &state) {
            self.sink.record(Diagnostic::ParseFailed {
                detail: detail.clone(),
            });
            return ParseOutcome {
                diagnostic: Some(detail),
                ..ParseOutcome::default()
            };
        }

        let state = state.take();
        let mut skip_reasons = state.skip_reasons;

        for open in &state.open {
            skip_reasons.push(format!("word element at slot {} was never closed", open.slot));
        }

        let words: WordSequence = state.slots.into_iter().flatten().collect();

        for reason in &skip_reasons {
            self.sink.record(Diagnostic::WordSkipped {
                reason: reason.clone(),
            });
        }
        for (index, word) in words.iter().enumerate() {
            if self.should_sample(index) {
                self.sink.record(Diagnostic::WordSampled {
                    index,
                    text: word.text.clone(),
                    bbox: word.bbox,
                });
            }
        }

        self.sink.record(Diagnostic::ParseFinished {
            words: words.len(),
            skipped: skip_reasons.len(),
            pages: state.pages.len(),
        });

        ParseOutcome {
            words,
            pages: state.pages,
            skipped: skip_reasons.len(),
            diagnostic: None,
        }
    }

    fn should_sample(&self, index: usize) -> bool {
        index < SAMPLE_HEAD || (self.sample_interval > 0 && index % self.sample_interval == 0)
    }
}

/// Parse hOCR markup into its word sequence, discarding diagnostics.
pub fn parse_hocr(markup: &str) -> WordSequence {
    HocrParser::new(&NullSink).parse(markup).words
}

// -- Scanner ------------------------------------------------------------------

#[derive(Debug, Default)]
struct ScanState {
    /// One slot per word element in start-tag order; filled at its end tag.
    slots: Vec<Option<Word>>,
    /// Word elements whose end tag has not been seen yet (innermost last).
    open: Vec<OpenWord>,
    /// Indices of the `ocr_page` elements currently open (innermost last).
    page_stack: Vec<usize>,
    pages: Vec<HocrPage>,
    skip_reasons: Vec<String>,
}

#[derive(Debug)]
struct OpenWord {
    slot: usize,
    bbox: BoundingBox,
    confidence: Option<f32>,
    page: Option<usize>,
    raw_text: String,
}

type Shared = Rc<RefCell<ScanState>>;

fn scan(markup: &str, state: &Shared) -> Result<(), String> {
    let element_state = Rc::clone(state);
    let text_state = Rc::clone(state);

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("[class]", move |el| {
                on_element(el, &element_state);
                Ok(())
            })],
            document_content_handlers: vec![doc_text!(move |chunk| {
                let mut state = text_state.borrow_mut();
                if let Some(open) = state.open.last_mut() {
                    open.raw_text.push_str(chunk.as_str());
                }
                Ok(())
            })],
            ..Settings::default()
        },
        |_: &[u8]| {},
    );

    rewriter
        .write(markup.as_bytes())
        .map_err(|err| format!("hOCR markup could not be scanned: {err}"))?;
    rewriter
        .end()
        .map_err(|err| format!("hOCR markup could not be finished: {err}"))?;

    Ok(())
}

fn on_element(el: &mut Element, state: &Shared) {
    let Some(class) = el.get_attribute("class") else {
        return;
    };

    if has_class_token(&class, PAGE_CLASS) {
        open_page(el, state);
    } else if has_class_token(&class, WORD_CLASS) {
        open_word(el, state);
    }
}

fn has_class_token(class: &str, token: &str) -> bool {
    class
        .split_whitespace()
        .any(|candidate| candidate.eq_ignore_ascii_case(token))
}

fn open_page(el: &mut Element, state: &Shared) {
    let props = el
        .get_attribute("title")
        .map(|title| TitleProperties::parse(&title))
        .unwrap_or_default();

    let index = {
        let mut st = state.borrow_mut();
        let index = props.ppageno.unwrap_or(st.pages.len());
        st.pages.push(HocrPage {
            index,
            bbox: props.bbox.and_then(Result::ok),
        });
        st.page_stack.push(index);
        index
    };

    let on_close = Rc::clone(state);
    let registered = el.end_tag_handlers().map(|handlers| {
        handlers.push(Box::new(move |_end: &mut EndTag<'_>| -> HandlerResult {
            let mut st = on_close.borrow_mut();
            if let Some(pos) = st.page_stack.iter().rposition(|&open| open == index) {
                st.page_stack.remove(pos);
            }
            Ok(())
        }));
    });

    // Void or self-closing page markers cannot enclose words.
    if registered.is_none() {
        state.borrow_mut().page_stack.pop();
    }
}

fn open_word(el: &mut Element, state: &Shared) {
    let props = match el.get_attribute("title") {
        Some(title) => TitleProperties::parse(&title),
        None => {
            state
                .borrow_mut()
                .skip_reasons
                .push("word element has no title attribute".into());
            return;
        }
    };

    let bbox = match props.bbox {
        Some(Ok(bbox)) => bbox,
        Some(Err(reason)) => {
            state.borrow_mut().skip_reasons.push(reason);
            return;
        }
        None => {
            state
                .borrow_mut()
                .skip_reasons
                .push("word title has no bbox property".into());
            return;
        }
    };

    let slot = {
        let mut st = state.borrow_mut();
        let slot = st.slots.len();
        st.slots.push(None);
        let page = st.page_stack.last().copied();
        st.open.push(OpenWord {
            slot,
            bbox,
            confidence: props.x_wconf,
            page,
            raw_text: String::new(),
        });
        slot
    };

    let on_close = Rc::clone(state);
    let registered = el.end_tag_handlers().map(|handlers| {
        handlers.push(Box::new(move |_end: &mut EndTag<'_>| -> HandlerResult {
            close_word(&on_close, slot);
            Ok(())
        }));
    });

    if registered.is_none() {
        let mut st = state.borrow_mut();
        st.open.retain(|open| open.slot != slot);
        st.skip_reasons
            .push("word element is self-closing and has no text".into());
    }
}

fn close_word(state: &Shared, slot: usize) {
    let mut st = state.borrow_mut();
    let Some(pos) = st.open.iter().rposition(|open| open.slot == slot) else {
        return;
    };
    let open = st.open.remove(pos);

    let decoded = html_escape::decode_html_entities(&open.raw_text);
    let text = decoded.trim();
    if text.is_empty() {
        st.skip_reasons
            .push(format!("word at {} has no text", open.bbox));
        return;
    }

    st.slots[open.slot] = Some(Word {
        text: text.to_string(),
        bbox: open.bbox,
        page: open.page,
        confidence: open.confidence,
    });
}
