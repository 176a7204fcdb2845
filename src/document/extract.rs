//! Text extraction from PDF content streams.
//!
//! Walks every page's decoded content stream with a small text-state
//! machine (`Tf`, `Tm`, `Td`, `TD`, `T*`, `TL`) and collects each show-text
//! operation (`Tj`, `TJ`, `'`, `"`) as one positioned [`TextSpan`]. Widths
//! are estimated from the font size; the engine only needs the origin and a
//! rough extent, not exact glyph metrics.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use super::{classify_headings, BBox, DocumentText, TextSpan};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};

/// Estimated advance per character, in em units.
pub(crate) const CHAR_WIDTH_EM: f32 = 0.5;
/// Fraction of the font size below the baseline.
pub(crate) const DESCENT_EM: f32 = 0.2;
/// Fraction of the font size above the baseline.
const ASCENT_EM: f32 = 0.8;

/// Extracts the positioned text of every page.
///
/// Fails with [`EditorError::CorruptDocument`] when the bytes are not a
/// parseable PDF; a page whose content stream cannot be decoded is logged
/// and skipped rather than failing the document.
pub fn extract(pdf_bytes: &[u8], config: &EditorConfig) -> EditorResult<DocumentText> {
    let doc = Document::load_mem(pdf_bytes).map_err(EditorError::corrupt)?;

    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let mut spans = Vec::new();

    for (index, (page_num, page_id)) in pages.iter().enumerate() {
        let fonts = page_fonts(&doc, *page_id);
        match doc.get_page_content(*page_id) {
            Ok(content) => {
                walk_content(&content, index, &fonts, config.default_font_size, &mut spans);
            }
            Err(e) => {
                log::warn!("failed to read content of page {}: {}", page_num, e);
            }
        }
    }

    let page_count = pages.len();
    classify_headings(&mut spans, page_count, config.heading_size_factor);

    Ok(DocumentText { spans, page_count })
}

/// Text-state machine over one page's content operations.
fn walk_content(
    content: &[u8],
    page: usize,
    fonts: &HashMap<String, String>,
    default_size: f32,
    spans: &mut Vec<TextSpan>,
) {
    let content = match Content::decode(content) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("failed to decode content stream on page {}: {}", page + 1, e);
            return;
        }
    };
    spans.extend(
        indexed_spans(&content, page, fonts, default_size)
            .into_iter()
            .map(|(_, span)| span),
    );
}

/// Like the page walk, but pairs each span with the index of the content
/// operation that produced it, so the engine can locate and remove the
/// exact show-text operation behind an anchored span.
pub(crate) fn indexed_spans(
    content: &Content,
    page: usize,
    fonts: &HashMap<String, String>,
    default_size: f32,
) -> Vec<(usize, TextSpan)> {
    let mut spans = Vec::new();
    let mut x = 0.0f32;
    let mut y = 0.0f32;
    let mut line_x = 0.0f32;
    let mut line_y = 0.0f32;
    let mut leading = 0.0f32;
    let mut font_res: Option<String> = None;
    let mut font_size = default_size;

    for (index, op) in content.operations.iter().enumerate() {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                x = 0.0;
                y = 0.0;
                line_x = 0.0;
                line_y = 0.0;
            }
            "Tf" => {
                if let (Some(Object::Name(name)), Some(size)) =
                    (operands.first(), operands.get(1).and_then(as_f32))
                {
                    font_res = Some(String::from_utf8_lossy(name).into_owned());
                    font_size = size;
                }
            }
            "Tm" => {
                if let (Some(e), Some(f)) = (
                    operands.get(4).and_then(as_f32),
                    operands.get(5).and_then(as_f32),
                ) {
                    x = e;
                    y = f;
                    line_x = e;
                    line_y = f;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(as_f32),
                    operands.get(1).and_then(as_f32),
                ) {
                    line_x += tx;
                    line_y += ty;
                    x = line_x;
                    y = line_y;
                    if op.operator == "TD" {
                        leading = -ty;
                    }
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(as_f32) {
                    leading = l;
                }
            }
            "T*" => {
                line_y -= leading;
                x = line_x;
                y = line_y;
            }
            "Tj" => {
                if let Some(text) = operands.first().and_then(decode_text) {
                    if let Some(span) =
                        make_span(page, &text, x, y, font_size, font_res.as_deref(), fonts)
                    {
                        spans.push((index, span));
                    }
                    x += advance(&text, font_size);
                }
            }
            "TJ" => {
                let mut text = String::new();
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        if let Some(part) = decode_text(item) {
                            text.push_str(&part);
                        }
                    }
                }
                if !text.is_empty() {
                    if let Some(span) =
                        make_span(page, &text, x, y, font_size, font_res.as_deref(), fonts)
                    {
                        spans.push((index, span));
                    }
                    x += advance(&text, font_size);
                }
            }
            "'" | "\"" => {
                line_y -= leading;
                x = line_x;
                y = line_y;
                if let Some(text) = operands.last().and_then(decode_text) {
                    if let Some(span) =
                        make_span(page, &text, x, y, font_size, font_res.as_deref(), fonts)
                    {
                        spans.push((index, span));
                    }
                    x += advance(&text, font_size);
                }
            }
            _ => {}
        }
    }
    spans
}

fn advance(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * CHAR_WIDTH_EM
}

fn make_span(
    page: usize,
    text: &str,
    x: f32,
    y: f32,
    size: f32,
    font_res: Option<&str>,
    fonts: &HashMap<String, String>,
) -> Option<TextSpan> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(TextSpan {
        page,
        text: trimmed.to_string(),
        bbox: BBox::new(
            x,
            y - size * DESCENT_EM,
            x + advance(text, size),
            y + size * ASCENT_EM,
        ),
        font_name: font_res.and_then(|r| fonts.get(r).cloned()),
        font_res: font_res.map(str::to_string),
        font_size: size,
        heading: false,
    })
}

fn as_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f),
        _ => None,
    }
}

/// Decodes a show-text operand to a string.
///
/// UTF-16BE strings (BOM-prefixed) are decoded as such; everything else is
/// read byte-per-character, which covers the standard Latin text encodings.
/// CID-keyed fonts with multi-byte codes are out of scope.
fn decode_text(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Maps page font resource names (e.g. "F1") to BaseFont names, walking up
/// the page tree for inherited `/Resources`.
fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<String, String> {
    let mut fonts = HashMap::new();

    let Some(resources) = resolve_inherited(doc, page_id, b"Resources") else {
        return fonts;
    };
    let resources = match resolve_ref(doc, resources).and_then(|o| o.as_dict().ok()) {
        Some(d) => d,
        None => return fonts,
    };
    let font_dict = match resources
        .get(b"Font")
        .ok()
        .and_then(|o| resolve_ref(doc, o))
        .and_then(|o| o.as_dict().ok())
    {
        Some(d) => d,
        None => return fonts,
    };

    for (name, value) in font_dict.iter() {
        let Some(font) = resolve_ref(doc, value).and_then(|o| o.as_dict().ok()) else {
            continue;
        };
        if let Ok(Object::Name(base)) = font.get(b"BaseFont") {
            fonts.insert(
                String::from_utf8_lossy(name).into_owned(),
                String::from_utf8_lossy(base).into_owned(),
            );
        }
    }
    fonts
}

fn resolve_ref<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Looks up a key on the page dictionary, following `/Parent` links when
/// the key is inheritable and absent on the page itself.
fn resolve_inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    loop {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_literal_string() {
        assert_eq!(decode_pdf_string(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_utf16be_string() {
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    #[test]
    fn test_walk_simple_stream() {
        let content = b"BT /F1 12 Tf 72 700 Td (Hello world) Tj ET";
        let mut spans = Vec::new();
        walk_content(content, 0, &HashMap::new(), 12.0, &mut spans);

        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.text, "Hello world");
        assert_eq!(span.font_res.as_deref(), Some("F1"));
        assert_eq!(span.font_size, 12.0);
        assert!((span.bbox.x0 - 72.0).abs() < 0.01);
        assert!((span.bbox.y0 - (700.0 - 12.0 * DESCENT_EM)).abs() < 0.01);
    }

    #[test]
    fn test_walk_tm_and_tj_array() {
        let content = b"BT /F1 10 Tf 1 0 0 1 100 650 Tm [(rev)(enue)] TJ ET";
        let mut spans = Vec::new();
        walk_content(content, 2, &HashMap::new(), 12.0, &mut spans);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "revenue");
        assert_eq!(spans[0].page, 2);
        assert!((spans[0].bbox.x0 - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_walk_multiline_td() {
        let content = b"BT /F1 12 Tf 72 700 Td (first line) Tj 0 -14 Td (second line) Tj ET";
        let mut spans = Vec::new();
        walk_content(content, 0, &HashMap::new(), 12.0, &mut spans);

        assert_eq!(spans.len(), 2);
        assert!((spans[0].bbox.y0 - spans[1].bbox.y0 - 14.0).abs() < 0.01);
    }

    #[test]
    fn test_corrupt_document_rejected() {
        let err = extract(b"definitely not a pdf", &EditorConfig::default()).unwrap_err();
        assert!(matches!(err, EditorError::CorruptDocument { .. }));
    }
}
