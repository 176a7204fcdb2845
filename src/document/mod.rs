//! Document text model.
//!
//! [`DocumentText`] is an immutable, request-scoped snapshot of every
//! located text run in a PDF. The resolver anchors operations against this
//! snapshot; the engine then mutates the live document in a second pass, so
//! one edit's cover rectangle can never corrupt another edit's target lookup.

pub mod extract;

pub use extract::extract;

/// Axis-aligned bounding box in PDF user-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A located run of text on a page with geometry and style.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// 0-based page index.
    pub page: usize,
    pub text: String,
    pub bbox: BBox,
    /// BaseFont name, when the font resource could be resolved.
    pub font_name: Option<String>,
    /// Page resource key of the span's font (e.g. "F1"), for re-use at
    /// insertion time.
    pub font_res: Option<String>,
    pub font_size: f32,
    /// Derived from font-size/style heuristics, see [`classify_headings`].
    pub heading: bool,
}

impl TextSpan {
    /// Style-independent heading heuristics carried over from the text
    /// shape itself: short mostly-capitalized runs, short runs ending in a
    /// colon, and short all-caps runs read as headings.
    fn looks_like_heading(&self) -> bool {
        let text = self.text.trim();
        if text.is_empty() {
            return false;
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        let capitalized = words
            .iter()
            .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
            .count();

        if words.len() <= 7 && capitalized * 2 > words.len() {
            return true;
        }
        if text.ends_with(':') && words.len() < 10 {
            return true;
        }
        if words.len() < 5 && text.chars().all(|c| !c.is_lowercase()) {
            return true;
        }
        false
    }
}

/// Ordered sequence of text spans for a whole document.
///
/// Produced fresh per request and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct DocumentText {
    /// Spans in document order (page order, then content-stream order).
    pub spans: Vec<TextSpan>,
    pub page_count: usize,
}

impl DocumentText {
    /// Spans on a single page, in content-stream order.
    pub fn page_spans(&self, page: usize) -> impl Iterator<Item = &TextSpan> {
        self.spans.iter().filter(move |s| s.page == page)
    }

    /// All heading spans, in document order.
    pub fn heading_spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.spans.iter().filter(|s| s.heading)
    }

    /// Whole-document text, space-joined, for the condensed LLM excerpt.
    pub fn full_text(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(span.text.trim());
        }
        out
    }
}

/// Flags heading spans: font size above `factor` times the page's modal
/// size, a bold BaseFont, or a heading-shaped run of text.
pub(crate) fn classify_headings(spans: &mut [TextSpan], page_count: usize, factor: f32) {
    for page in 0..page_count {
        let modal = modal_font_size(spans.iter().filter(|s| s.page == page));
        for span in spans.iter_mut().filter(|s| s.page == page) {
            let bold = span
                .font_name
                .as_deref()
                .is_some_and(|n| n.to_ascii_lowercase().contains("bold"));
            span.heading =
                span.font_size > modal * factor || bold || span.looks_like_heading();
        }
    }
}

/// Most frequent font size on a page, at 0.5pt granularity. Falls back to
/// 12pt for pages with no text.
fn modal_font_size<'a>(spans: impl Iterator<Item = &'a TextSpan>) -> f32 {
    use std::collections::HashMap;
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for span in spans {
        *counts.entry((span.font_size * 2.0).round() as i32).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|&(key, count)| (count, key))
        .map(|(key, _)| key as f32 / 2.0)
        .unwrap_or(12.0)
}
