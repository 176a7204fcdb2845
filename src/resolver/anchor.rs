//! Span anchoring shared by both resolver tiers.
//!
//! Targets are addressed by original-text substring, which is inherently
//! ambiguous. The ranking is explicit and deterministic: candidates are
//! collected in document order, a
//! location hint prefers the first candidate inside the hinted region, an
//! empty hinted region falls back to the whole document, and remaining
//! ambiguity is tie-broken to the first candidate and recorded as a note
//! rather than a failure.

use std::collections::BTreeSet;

use super::{
    EditKind, EditRequest, OperationSource, ResolutionResult, ResolvedEdit, SkipReason,
    SkippedEdit, SpanRef,
};
use crate::document::{DocumentText, TextSpan};

/// Anchors each request against the immutable snapshot, preserving order.
/// Requests whose target cannot be located are dropped into `skipped`.
pub fn anchor_requests(
    requests: &[EditRequest],
    doc: &DocumentText,
    source: OperationSource,
) -> ResolutionResult {
    let mut result = ResolutionResult::default();

    for request in requests {
        match anchor_one(request, doc) {
            Ok((target, note)) => {
                result.operations.push(ResolvedEdit {
                    kind: request.kind,
                    target,
                    new_text: request.new_text.clone(),
                    source,
                    note,
                });
            }
            Err(reason) => {
                log::debug!(
                    "dropping {} request for '{}': {}",
                    request.kind.as_str(),
                    request.target_text,
                    reason.as_str()
                );
                result.skipped.push(SkippedEdit {
                    kind: request.kind,
                    target_text: request.target_text.clone(),
                    reason,
                });
            }
        }
    }

    result
}

fn anchor_one(
    request: &EditRequest,
    doc: &DocumentText,
) -> Result<(SpanRef, Option<String>), SkipReason> {
    let candidates = collect_candidates(request, doc);
    if candidates.is_empty() {
        return Err(SkipReason::TargetNotFound);
    }

    let chosen = match request.hint.as_deref() {
        Some(hint) => {
            let region = hinted_pages(hint, doc);
            candidates
                .iter()
                .find(|span| region.contains(&span.page))
                .copied()
                // Zero matches inside the hinted region: fall back to the
                // whole document before declaring not-found.
                .unwrap_or(candidates[0])
        }
        None => candidates[0],
    };

    let note = (candidates.len() > 1).then(|| {
        format!(
            "ambiguous target: {} matches, first in document order used",
            candidates.len()
        )
    });

    Ok((
        SpanRef {
            page: chosen.page,
            text: chosen.text.clone(),
            bbox: chosen.bbox,
            font_res: chosen.font_res.clone(),
            font_size: chosen.font_size,
        },
        note,
    ))
}

/// Case-insensitive substring candidates in document order. Heading edits
/// search heading spans first and widen to every span only when no
/// heading matches.
fn collect_candidates<'a>(request: &EditRequest, doc: &'a DocumentText) -> Vec<&'a TextSpan> {
    let needle = request.target_text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let matches = |span: &&TextSpan| span.text.to_lowercase().contains(&needle);

    if request.kind == EditKind::ChangeHeading {
        let headings: Vec<&TextSpan> = doc.heading_spans().filter(matches).collect();
        if !headings.is_empty() {
            return headings;
        }
    }
    doc.spans.iter().filter(matches).collect()
}

/// Pages making up the hinted region: any page with a span containing the
/// hint phrase, or sharing at least half of the hint's words.
fn hinted_pages(hint: &str, doc: &DocumentText) -> BTreeSet<usize> {
    let hint_lower = hint.to_lowercase();
    let hint_words: Vec<&str> = hint_lower.split_whitespace().collect();

    doc.spans
        .iter()
        .filter(|span| {
            let text = span.text.to_lowercase();
            if text.contains(&hint_lower) {
                return true;
            }
            if hint_words.is_empty() {
                return false;
            }
            let overlap = hint_words
                .iter()
                .filter(|w| text.split_whitespace().any(|t| t == **w))
                .count();
            overlap * 2 >= hint_words.len()
        })
        .map(|span| span.page)
        .collect()
}
