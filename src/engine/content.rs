//! Low-level lopdf page mutations.
//!
//! Text replacement works on the content stream itself: the show-text
//! operation behind the span is blanked so the original text is gone from
//! the stream, an opaque white rectangle is painted over the span's box,
//! and the replacement text is shown at the original baseline with the
//! original font resource and size. Highlights are `/Highlight`
//! annotations and leave the content stream untouched.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::document::extract::{indexed_spans, DESCENT_EM};
use crate::document::BBox;
use crate::error::{EditorError, EditorResult};
use crate::resolver::SpanRef;

/// Resource name prefix for the registered fallback font.
const FALLBACK_FONT_PREFIX: &str = "FHv";

/// Replaces `span` with `new_text` inside the page's content stream.
///
/// The show-text operation that produced the span is blanked first, so the
/// original text no longer appears in the stream, then a white rectangle is
/// painted over the span's box and the replacement is shown at the original
/// baseline. Falls back to a freshly registered Helvetica resource when the
/// span carries no usable font resource.
pub(crate) fn replace_span(
    doc: &mut Document,
    page_id: ObjectId,
    span: &SpanRef,
    new_text: &str,
    default_font_size: f32,
) -> EditorResult<()> {
    let err = |e: lopdf::Error| EditorError::pdf(e.to_string(), Some(span.page));

    let font = match &span.font_res {
        Some(name) => name.clone(),
        None => register_fallback_font(doc, page_id, span.page)?,
    };
    let size = if span.font_size > 0.0 {
        span.font_size
    } else {
        default_font_size
    };
    let baseline = span.bbox.y0 + size * DESCENT_EM;

    let raw = doc.get_page_content(page_id).map_err(err)?;
    let mut content = Content::decode(&raw).map_err(err)?;
    blank_span_op(&mut content, span, default_font_size);

    let mut bytes = content.encode().map_err(err)?;
    bytes.push(b'\n');
    bytes.extend_from_slice(&cover_ops(&span.bbox));
    bytes.extend_from_slice(&show_text_ops(&font, size, span.bbox.x0, baseline, new_text));
    doc.change_page_content(page_id, bytes).map_err(err)
}

/// Empties the operands of the show-text operation that produced `span`,
/// located by re-walking the content with the same text-state machine used
/// for extraction and matching on text and box origin.
fn blank_span_op(content: &mut Content, span: &SpanRef, default_font_size: f32) {
    let target = indexed_spans(content, span.page, &HashMap::new(), default_font_size)
        .into_iter()
        .find(|(_, s)| {
            s.text == span.text
                && (s.bbox.x0 - span.bbox.x0).abs() < 0.5
                && (s.bbox.y0 - span.bbox.y0).abs() < 0.5
        });
    let Some((index, _)) = target else {
        log::warn!(
            "show-text operation for {:?} not found on page {}; covering only",
            span.text,
            span.page + 1
        );
        return;
    };

    let op = &mut content.operations[index];
    match op.operator.as_str() {
        "Tj" => {
            if let Some(operand) = op.operands.first_mut() {
                *operand = Object::string_literal("");
            }
        }
        "TJ" => {
            if let Some(operand) = op.operands.first_mut() {
                *operand = Object::Array(Vec::new());
            }
        }
        // ' and " also move to the next line; keep the operator so the
        // text state stays intact and empty only the shown string.
        _ => {
            if let Some(operand) = op.operands.last_mut() {
                *operand = Object::string_literal("");
            }
        }
    }
}

/// Attaches a `/Highlight` annotation covering `bbox` to the page.
pub(crate) fn highlight_span(
    doc: &mut Document,
    page_id: ObjectId,
    page: usize,
    bbox: &BBox,
    color: [f32; 3],
) -> EditorResult<()> {
    let annot = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => vec![
            Object::Real(bbox.x0),
            Object::Real(bbox.y0),
            Object::Real(bbox.x1),
            Object::Real(bbox.y1),
        ],
        // One quad, counter-clockwise from the top-left corner.
        "QuadPoints" => vec![
            Object::Real(bbox.x0),
            Object::Real(bbox.y1),
            Object::Real(bbox.x1),
            Object::Real(bbox.y1),
            Object::Real(bbox.x0),
            Object::Real(bbox.y0),
            Object::Real(bbox.x1),
            Object::Real(bbox.y0),
        ],
        "C" => vec![
            Object::Real(color[0]),
            Object::Real(color[1]),
            Object::Real(color[2]),
        ],
    };
    let annot_id = doc.add_object(Object::Dictionary(annot));
    add_annotation(doc, page_id, page, annot_id)
}

/// Opaque white rectangle over the box, isolated with q/Q.
fn cover_ops(bbox: &BBox) -> Vec<u8> {
    format!(
        "q\n1 1 1 rg\n{} {} {} {} re\nf\nQ\n",
        bbox.x0,
        bbox.y0,
        bbox.width(),
        bbox.height()
    )
    .into_bytes()
}

/// Text object showing `text` at the given baseline origin.
///
/// Characters are written as single Latin-1 bytes, mirroring the byte-wise
/// decoding used on extraction; anything outside that range degrades to '?'.
fn show_text_ops(font: &str, size: f32, x: f32, baseline: f32, text: &str) -> Vec<u8> {
    let mut ops = format!("BT\n/{} {} Tf\n1 0 0 1 {} {} Tm\n(", font, size, x, baseline).into_bytes();
    for c in text.chars() {
        match c {
            '\\' => ops.extend_from_slice(b"\\\\"),
            '(' => ops.extend_from_slice(b"\\("),
            ')' => ops.extend_from_slice(b"\\)"),
            '\n' => ops.extend_from_slice(b"\\n"),
            '\r' => ops.extend_from_slice(b"\\r"),
            c if (c as u32) <= 0xFF => ops.push(c as u32 as u8),
            _ => ops.push(b'?'),
        }
    }
    ops.extend_from_slice(b") Tj\nET\n");
    ops
}

/// Registers a Helvetica Type1 font on the page and returns its resource
/// name. The name is chosen to avoid collisions with existing resources.
fn register_fallback_font(
    doc: &mut Document,
    page_id: ObjectId,
    page: usize,
) -> EditorResult<String> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let existing = page_font_names(doc, page_id);
    let mut n = 0;
    let name = loop {
        let candidate = format!("{}{}", FALLBACK_FONT_PREFIX, n);
        if !existing.contains(&candidate) {
            break candidate;
        }
        n += 1;
    };

    attach_font(doc, page_id, page, &name, font_id)?;
    Ok(name)
}

fn page_font_names(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let (inline, resource_ids) = doc.get_page_resources(page_id);
    let mut dicts: Vec<&Dictionary> = inline.into_iter().collect();
    for id in resource_ids {
        if let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) {
            dicts.push(dict);
        }
    }

    let mut names = Vec::new();
    for dict in dicts {
        let fonts = match dict.get(b"Font") {
            Ok(Object::Dictionary(f)) => Some(f),
            Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
            _ => None,
        };
        if let Some(fonts) = fonts {
            for (key, _) in fonts.iter() {
                names.push(String::from_utf8_lossy(key).into_owned());
            }
        }
    }
    names
}

/// Where the page's font dictionary lives, to one level of indirection.
enum FontSlot {
    PageInline,
    ResourceObject(ObjectId),
    FontObject(ObjectId),
    NoResources,
}

fn attach_font(
    doc: &mut Document,
    page_id: ObjectId,
    page: usize,
    name: &str,
    font_id: ObjectId,
) -> EditorResult<()> {
    let err = |e: lopdf::Error| EditorError::pdf(e.to_string(), Some(page));

    let slot = {
        let page_dict = doc.get_dictionary(page_id).map_err(err)?;
        match page_dict.get(b"Resources") {
            Ok(Object::Reference(res_id)) => {
                let res = doc.get_dictionary(*res_id).map_err(err)?;
                match res.get(b"Font") {
                    Ok(Object::Reference(f_id)) => FontSlot::FontObject(*f_id),
                    _ => FontSlot::ResourceObject(*res_id),
                }
            }
            Ok(Object::Dictionary(res)) => match res.get(b"Font") {
                Ok(Object::Reference(f_id)) => FontSlot::FontObject(*f_id),
                _ => FontSlot::PageInline,
            },
            _ => FontSlot::NoResources,
        }
    };

    match slot {
        FontSlot::FontObject(f_id) => {
            let fonts = doc
                .get_object_mut(f_id)
                .and_then(Object::as_dict_mut)
                .map_err(err)?;
            fonts.set(name, Object::Reference(font_id));
        }
        FontSlot::ResourceObject(res_id) => {
            let res = doc
                .get_object_mut(res_id)
                .and_then(Object::as_dict_mut)
                .map_err(err)?;
            set_font_entry(res, name, font_id);
        }
        FontSlot::PageInline => {
            let page_dict = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(err)?;
            if let Ok(Object::Dictionary(res)) = page_dict.get_mut(b"Resources") {
                set_font_entry(res, name, font_id);
            }
        }
        FontSlot::NoResources => {
            let page_dict = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(err)?;
            page_dict.set(
                "Resources",
                dictionary! {
                    "Font" => dictionary! { name => Object::Reference(font_id) },
                },
            );
        }
    }
    Ok(())
}

fn set_font_entry(resources: &mut Dictionary, name: &str, font_id: ObjectId) {
    if let Ok(Object::Dictionary(fonts)) = resources.get_mut(b"Font") {
        fonts.set(name, Object::Reference(font_id));
    } else {
        resources.set("Font", dictionary! { name => Object::Reference(font_id) });
    }
}

/// Splices a new annotation reference into the page's `/Annots` array,
/// creating it when absent and following one level of indirection.
fn add_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    page: usize,
    annot_id: ObjectId,
) -> EditorResult<()> {
    let err = |e: lopdf::Error| EditorError::pdf(e.to_string(), Some(page));

    let indirect = {
        let page_dict = doc.get_dictionary(page_id).map_err(err)?;
        match page_dict.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    if let Some(arr_id) = indirect {
        let arr = doc
            .get_object_mut(arr_id)
            .and_then(Object::as_array_mut)
            .map_err(err)?;
        arr.push(Object::Reference(annot_id));
        return Ok(());
    }

    let page_dict = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(err)?;
    if let Ok(Object::Array(arr)) = page_dict.get_mut(b"Annots") {
        arr.push(Object::Reference(annot_id));
    } else {
        page_dict.set("Annots", vec![Object::Reference(annot_id)]);
    }
    Ok(())
}
