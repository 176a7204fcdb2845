//! Edit application engine.
//!
//! Applies anchored operations to the PDF sequentially, in resolved order.
//! Anchoring already happened against an immutable text snapshot, so the
//! mutations here never invalidate one another's coordinates. A failing
//! operation is recorded and skipped; it never aborts the rest.

pub mod content;

use lopdf::{Document, ObjectId};

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::resolver::{EditKind, ResolutionResult, ResolvedEdit, SkippedEdit};

/// Result of attempting a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Applied,
    Skipped,
}

/// Per-operation record in the final report.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub kind: EditKind,
    pub target_text: String,
    pub status: OutcomeStatus,
    /// Ambiguity or failure detail, when there is any.
    pub note: Option<String>,
}

impl EditOutcome {
    pub(crate) fn from_skip(skip: &SkippedEdit) -> Self {
        Self {
            kind: skip.kind,
            target_text: skip.target_text.clone(),
            status: OutcomeStatus::Skipped,
            note: Some(skip.reason.as_str().to_string()),
        }
    }
}

/// Edited document plus the fate of every requested operation.
#[derive(Debug, Clone)]
pub struct EditReport {
    pub pdf: Vec<u8>,
    pub outcomes: Vec<EditOutcome>,
}

impl EditReport {
    pub fn applied_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Applied)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.applied_count()
    }
}

/// Applies resolved operations to PDF bytes.
pub struct EditEngine {
    config: EditorConfig,
}

impl EditEngine {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Applies every operation in order and returns the edited bytes with
    /// one outcome per operation. Only an unparseable document or an
    /// unsaveable result fail the whole call.
    pub fn apply(
        &self,
        pdf_bytes: &[u8],
        resolution: &ResolutionResult,
    ) -> EditorResult<(Vec<u8>, Vec<EditOutcome>)> {
        let mut doc = Document::load_mem(pdf_bytes).map_err(EditorError::corrupt)?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

        let mut outcomes = Vec::with_capacity(resolution.operations.len());
        for op in &resolution.operations {
            let outcome = match self.apply_one(&mut doc, &pages, op) {
                Ok(()) => {
                    log::debug!("applied {} to '{}'", op.kind.as_str(), op.target.text);
                    EditOutcome {
                        kind: op.kind,
                        target_text: op.target.text.clone(),
                        status: OutcomeStatus::Applied,
                        note: op.note.clone(),
                    }
                }
                Err(e) => {
                    log::warn!("{} on '{}' failed: {}", op.kind.as_str(), op.target.text, e);
                    EditOutcome {
                        kind: op.kind,
                        target_text: op.target.text.clone(),
                        status: OutcomeStatus::Skipped,
                        note: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| EditorError::pdf(e.to_string(), None))?;
        Ok((output, outcomes))
    }

    fn apply_one(
        &self,
        doc: &mut Document,
        pages: &[ObjectId],
        op: &ResolvedEdit,
    ) -> EditorResult<()> {
        let page_id = *pages.get(op.target.page).ok_or_else(|| {
            EditorError::pdf(
                format!("page index {} out of range", op.target.page),
                Some(op.target.page),
            )
        })?;

        match op.kind {
            EditKind::ReplaceText | EditKind::ChangeHeading => {
                let new_text = op.new_text.as_deref().ok_or_else(|| {
                    EditorError::InvalidInput {
                        parameter: "new_text".to_string(),
                        reason: format!("{} requires replacement text", op.kind.as_str()),
                    }
                })?;
                content::replace_span(
                    doc,
                    page_id,
                    &op.target,
                    new_text,
                    self.config.default_font_size,
                )
            }
            EditKind::HighlightText => content::highlight_span(
                doc,
                page_id,
                op.target.page,
                &op.target.bbox,
                self.config.highlight_color,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{self, BBox};
    use crate::resolver::{OperationSource, SpanRef};
    use lopdf::{dictionary, Object, Stream};

    fn one_page_pdf(content: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.as_bytes().to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        });
        if let Ok(page) = doc.get_object_mut(page_id) {
            if let Ok(dict) = page.as_dict_mut() {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn span_at(x: f32, y: f32, text: &str, size: f32) -> SpanRef {
        let width = text.chars().count() as f32 * size * document::extract::CHAR_WIDTH_EM;
        SpanRef {
            page: 0,
            text: text.to_string(),
            bbox: BBox::new(
                x,
                y - size * document::extract::DESCENT_EM,
                x + width,
                y + size * 0.8,
            ),
            font_res: Some("F1".to_string()),
            font_size: size,
        }
    }

    fn resolution(ops: Vec<ResolvedEdit>) -> ResolutionResult {
        ResolutionResult {
            operations: ops,
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_replace_round_trips_through_extraction() {
        let pdf = one_page_pdf("BT /F1 12 Tf 72 700 Td (Hello world) Tj ET");
        let config = EditorConfig::default();
        let engine = EditEngine::new(&config);

        let op = ResolvedEdit {
            kind: EditKind::ReplaceText,
            target: span_at(72.0, 700.0, "Hello world", 12.0),
            new_text: Some("Goodbye".to_string()),
            source: OperationSource::RuleBased,
            note: None,
        };
        let (out, outcomes) = engine.apply(&pdf, &resolution(vec![op])).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, OutcomeStatus::Applied);

        let text = document::extract(&out, &config).unwrap();
        let span = text
            .spans
            .iter()
            .find(|s| s.text == "Goodbye")
            .expect("replacement text extractable");
        assert!((span.bbox.x0 - 72.0).abs() < 0.01);
        assert_eq!(span.font_size, 12.0);
        // The original show-text operation is blanked, not just covered.
        assert!(!text.spans.iter().any(|s| s.text.contains("Hello")));
        assert!(!text.full_text().contains("Hello world"));
    }

    #[test]
    fn test_highlight_adds_annotation_and_keeps_text() {
        let pdf = one_page_pdf("BT /F1 12 Tf 72 700 Td (Revenue grew) Tj ET");
        let config = EditorConfig::default();
        let engine = EditEngine::new(&config);

        let op = ResolvedEdit {
            kind: EditKind::HighlightText,
            target: span_at(72.0, 700.0, "Revenue grew", 12.0),
            new_text: None,
            source: OperationSource::RuleBased,
            note: None,
        };
        let (out, outcomes) = engine.apply(&pdf, &resolution(vec![op])).unwrap();
        assert_eq!(outcomes[0].status, OutcomeStatus::Applied);

        let text = document::extract(&out, &config).unwrap();
        assert!(text.spans.iter().any(|s| s.text == "Revenue grew"));

        let doc = Document::load_mem(&out).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let annots = page.get(b"Annots").unwrap().as_array().unwrap();
        assert_eq!(annots.len(), 1);
    }

    #[test]
    fn test_out_of_range_page_is_skipped_not_fatal() {
        let pdf = one_page_pdf("BT /F1 12 Tf 72 700 Td (Hello) Tj ET");
        let engine = EditEngine::new(&EditorConfig::default());

        let mut target = span_at(72.0, 700.0, "Hello", 12.0);
        target.page = 9;
        let op = ResolvedEdit {
            kind: EditKind::HighlightText,
            target,
            new_text: None,
            source: OperationSource::RuleBased,
            note: None,
        };
        let (out, outcomes) = engine.apply(&pdf, &resolution(vec![op])).unwrap();
        assert_eq!(outcomes[0].status, OutcomeStatus::Skipped);
        assert!(outcomes[0].note.as_deref().unwrap().contains("out of range"));
        assert!(Document::load_mem(&out).is_ok());
    }

    #[test]
    fn test_missing_font_resource_falls_back() {
        let pdf = one_page_pdf("BT /F1 12 Tf 72 700 Td (Hello) Tj ET");
        let config = EditorConfig::default();
        let engine = EditEngine::new(&config);

        let mut target = span_at(72.0, 700.0, "Hello", 12.0);
        target.font_res = None;
        let op = ResolvedEdit {
            kind: EditKind::ReplaceText,
            target,
            new_text: Some("World".to_string()),
            source: OperationSource::RuleBased,
            note: None,
        };
        let (out, outcomes) = engine.apply(&pdf, &resolution(vec![op])).unwrap();
        assert_eq!(outcomes[0].status, OutcomeStatus::Applied);

        let text = document::extract(&out, &config).unwrap();
        let span = text.spans.iter().find(|s| s.text == "World").unwrap();
        assert_eq!(span.font_name.as_deref(), Some("Helvetica"));
    }

    #[test]
    fn test_report_counts() {
        let report = EditReport {
            pdf: Vec::new(),
            outcomes: vec![
                EditOutcome {
                    kind: EditKind::ReplaceText,
                    target_text: "a".to_string(),
                    status: OutcomeStatus::Applied,
                    note: None,
                },
                EditOutcome {
                    kind: EditKind::HighlightText,
                    target_text: "b".to_string(),
                    status: OutcomeStatus::Skipped,
                    note: Some("target not found".to_string()),
                },
            ],
        };
        assert_eq!(report.applied_count(), 1);
        assert_eq!(report.skipped_count(), 1);
    }
}
