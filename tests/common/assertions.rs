//! Custom assertions for PDF editing tests.
//!
//! Domain-specific assertions over extracted text and page annotations,
//! for readable tests with useful failure messages.

use lopdf::{Document, Object};
use promptpdf::document::{self, DocumentText};
use promptpdf::EditorConfig;

/// Extracts positioned text, panicking on unparseable input.
pub fn extract_or_panic(pdf: &[u8]) -> DocumentText {
    document::extract(pdf, &EditorConfig::default()).expect("PDF should be extractable")
}

/// Asserts that some span's text contains `needle`.
pub fn assert_contains_text(pdf: &[u8], needle: &str) {
    let text = extract_or_panic(pdf);
    assert!(
        text.spans.iter().any(|s| s.text.contains(needle)),
        "'{}' should be extractable but was not found; spans: {:?}",
        needle,
        text.spans.iter().map(|s| &s.text).collect::<Vec<_>>()
    );
}

/// Asserts that no span's text contains `needle`.
pub fn assert_missing_text(pdf: &[u8], needle: &str) {
    let text = extract_or_panic(pdf);
    assert!(
        !text.spans.iter().any(|s| s.text.contains(needle)),
        "'{}' should have been removed but is still extractable",
        needle
    );
}

/// Asserts that a span with exactly `text` sits at the given origin.
pub fn assert_span_at(pdf: &[u8], text: &str, page: usize, x: f32) {
    let extracted = extract_or_panic(pdf);
    let found = extracted
        .spans
        .iter()
        .any(|s| s.page == page && s.text == text && (s.bbox.x0 - x).abs() < 0.5);
    assert!(
        found,
        "span '{}' expected on page {} at x={}, spans: {:?}",
        text,
        page,
        x,
        extracted
            .spans
            .iter()
            .map(|s| (s.page, &s.text, s.bbox.x0))
            .collect::<Vec<_>>()
    );
}

/// Asserts the bytes parse as a PDF with the expected page count.
pub fn assert_valid_pdf(pdf: &[u8], pages: usize) {
    let doc = Document::load_mem(pdf).expect("output should be a parseable PDF");
    assert_eq!(doc.get_pages().len(), pages, "unexpected page count");
}

/// Counts annotations attached to a zero-based page index.
pub fn annotation_count(pdf: &[u8], page: usize) -> usize {
    let doc = Document::load_mem(pdf).expect("output should be a parseable PDF");
    let page_id = match doc.get_pages().into_values().nth(page) {
        Some(id) => id,
        None => return 0,
    };
    let Ok(page_dict) = doc.get_dictionary(page_id) else {
        return 0;
    };
    match page_dict.get(b"Annots") {
        Ok(Object::Array(arr)) => arr.len(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_array)
            .map(Vec::len)
            .unwrap_or(0),
        _ => 0,
    }
}

/// Returns the `/Subtype` names of a page's annotations.
pub fn annotation_subtypes(pdf: &[u8], page: usize) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("output should be a parseable PDF");
    let Some(page_id) = doc.get_pages().into_values().nth(page) else {
        return Vec::new();
    };
    let Ok(page_dict) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let refs: Vec<Object> = match page_dict.get(b"Annots") {
        Ok(Object::Array(arr)) => arr.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_array)
            .map(Clone::clone)
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    refs.iter()
        .filter_map(|r| match r {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        })
        .filter_map(|d| match d.get(b"Subtype") {
            Ok(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        })
        .collect()
}
