//! Rule-based resolver tier.
//!
//! Deterministic pattern matching over a fixed set of instruction
//! phrasings. Parameters are always taken from quoted substrings (single
//! or double quotes), so an instruction with no quotes resolves to zero
//! operations rather than guessing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{EditKind, EditRequest, InstructionResolver, OperationSource};
use crate::document::DocumentText;
use crate::error::EditorResult;

static REPLACE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?i)change\s+['"]([^'"]+)['"]\s+to\s+['"]([^'"]+)['"]"#)
            .expect("valid replace pattern"),
        Regex::new(r#"(?i)replace\s+['"]([^'"]+)['"]\s+with\s+['"]([^'"]+)['"]"#)
            .expect("valid replace pattern"),
    ]
});

static HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![Regex::new(
        r#"(?i)(?:change|modify|update)\s+(?:the\s+)?(?:heading|title)\s+(?:from\s+)?['"]([^'"]+)['"]\s+to\s+['"]([^'"]+)['"]"#,
    )
    .expect("valid heading pattern")]
});

static HIGHLIGHT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?i)highlight\s+['"]([^'"]+)['"]"#).expect("valid highlight pattern"),
        Regex::new(r#"(?i)mark\s+['"]([^'"]+)['"]\s+in\s+yellow"#)
            .expect("valid highlight pattern"),
        Regex::new(r#"(?i)emphasize\s+['"]([^'"]+)['"]"#).expect("valid highlight pattern"),
    ]
});

/// Location-hint phrase, either leading ("in the conclusion, change ...")
/// or trailing ("highlight 'x' in the summary").
static HINT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"(?i)\bin the ([a-z][a-z0-9 _-]*?)\s*,"#).expect("valid hint pattern"),
        Regex::new(r#"(?i)\bin the ([a-z][a-z0-9 _-]*?)\s*\.?\s*$"#).expect("valid hint pattern"),
    ]
});

/// Quoted parameter regions, blanked out before hint extraction so text
/// inside a parameter can never read as a location hint.
static QUOTED_REGION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"][^'"]*['"]"#).expect("valid quote pattern"));

/// Deterministic fallback tier matching a fixed set of phrasings.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedResolver;

impl RuleBasedResolver {
    pub fn new() -> Self {
        Self
    }

    fn parse(&self, instruction: &str) -> Vec<EditRequest> {
        let hint = extract_hint(instruction);
        let mut requests = Vec::new();

        // Requests are emitted grouped by kind, not in instruction order.
        // Each one is anchored independently against the same immutable
        // snapshot, so emission order carries no meaning.
        //
        // Heading phrasings carry the words "heading"/"title" between the
        // verb and the quote, so they never collide with the generic
        // replace phrasings below.
        for pattern in HEADING_PATTERNS.iter() {
            for caps in pattern.captures_iter(instruction) {
                requests.push(EditRequest {
                    kind: EditKind::ChangeHeading,
                    target_text: caps[1].to_string(),
                    new_text: Some(caps[2].to_string()),
                    hint: hint.clone(),
                });
            }
        }

        for pattern in REPLACE_PATTERNS.iter() {
            for caps in pattern.captures_iter(instruction) {
                requests.push(EditRequest {
                    kind: EditKind::ReplaceText,
                    target_text: caps[1].to_string(),
                    new_text: Some(caps[2].to_string()),
                    hint: hint.clone(),
                });
            }
        }

        for pattern in HIGHLIGHT_PATTERNS.iter() {
            for caps in pattern.captures_iter(instruction) {
                let request = EditRequest {
                    kind: EditKind::HighlightText,
                    target_text: caps[1].to_string(),
                    new_text: None,
                    hint: hint.clone(),
                };
                // "mark 'x' in yellow" also matches other highlight
                // phrasings in compound instructions; drop exact repeats.
                if !requests.contains(&request) {
                    requests.push(request);
                }
            }
        }

        requests
    }
}

fn extract_hint(instruction: &str) -> Option<String> {
    let unquoted = QUOTED_REGION.replace_all(instruction, " ");
    for pattern in HINT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&unquoted) {
            let hint = caps[1].trim().to_string();
            // "mark 'x' in yellow" is a highlight phrasing, not a location.
            if hint.eq_ignore_ascii_case("yellow") {
                continue;
            }
            if !hint.is_empty() {
                return Some(hint);
            }
        }
    }
    None
}

impl InstructionResolver for RuleBasedResolver {
    fn resolve(&self, instruction: &str, _doc: &DocumentText) -> EditorResult<Vec<EditRequest>> {
        let requests = self.parse(instruction);
        log::debug!(
            "rule-based tier matched {} request(s) in instruction",
            requests.len()
        );
        Ok(requests)
    }

    fn name(&self) -> &str {
        "rule-based"
    }

    fn source(&self) -> OperationSource {
        OperationSource::RuleBased
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(instruction: &str) -> Vec<EditRequest> {
        RuleBasedResolver::new().parse(instruction)
    }

    #[test]
    fn test_change_to_phrasing() {
        let requests = parse("Change 'foo' to 'bar'");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, EditKind::ReplaceText);
        assert_eq!(requests[0].target_text, "foo");
        assert_eq!(requests[0].new_text.as_deref(), Some("bar"));
    }

    #[test]
    fn test_replace_with_phrasing() {
        let requests = parse("replace \"artificial intelligence\" with \"machine learning\"");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target_text, "artificial intelligence");
        assert_eq!(requests[0].new_text.as_deref(), Some("machine learning"));
    }

    #[test]
    fn test_heading_phrasings() {
        for instruction in [
            "change the heading 'Background' to 'Foundational Concepts'",
            "modify heading 'Background' to 'Foundational Concepts'",
            "update the title 'Background' to 'Foundational Concepts'",
        ] {
            let requests = parse(instruction);
            assert_eq!(requests.len(), 1, "instruction: {instruction}");
            assert_eq!(requests[0].kind, EditKind::ChangeHeading);
            assert_eq!(requests[0].target_text, "Background");
        }
    }

    #[test]
    fn test_heading_does_not_double_resolve() {
        let requests = parse("change the heading 'Intro' to 'Overview'");
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn test_highlight_phrasings() {
        for instruction in [
            "Highlight 'revenue'",
            "mark 'revenue' in yellow",
            "emphasize 'revenue'",
        ] {
            let requests = parse(instruction);
            assert_eq!(requests.len(), 1, "instruction: {instruction}");
            assert_eq!(requests[0].kind, EditKind::HighlightText);
            assert_eq!(requests[0].target_text, "revenue");
            assert!(requests[0].new_text.is_none());
        }
    }

    #[test]
    fn test_no_quotes_resolves_nothing() {
        assert!(parse("change the tone to be more formal").is_empty());
        assert!(parse("highlight the important parts").is_empty());
        assert!(parse("make it shorter").is_empty());
    }

    #[test]
    fn test_leading_hint() {
        let requests = parse("In the conclusion, change 'foo' to 'bar'");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].hint.as_deref(), Some("conclusion"));
    }

    #[test]
    fn test_trailing_hint() {
        let requests = parse("highlight 'revenue' in the summary");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].hint.as_deref(), Some("summary"));
    }

    #[test]
    fn test_quoted_text_is_not_a_hint() {
        let requests = parse("Change 'costs in the appendix, net' to 'expenses'");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].target_text, "costs in the appendix, net");
        assert!(requests[0].hint.is_none());
    }

    #[test]
    fn test_hint_outside_quotes_survives_quoted_noise() {
        let requests = parse("In the conclusion, change 'foo in the body, x' to 'bar'");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].hint.as_deref(), Some("conclusion"));
    }

    #[test]
    fn test_mark_in_yellow_is_not_a_hint() {
        let requests = parse("mark 'revenue' in yellow");
        assert_eq!(requests.len(), 1);
        assert!(requests[0].hint.is_none());
    }

    #[test]
    fn test_multiple_requests_keep_order() {
        let requests = parse("Change 'alpha' to 'beta' and highlight 'gamma'");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].kind, EditKind::ReplaceText);
        assert_eq!(requests[1].kind, EditKind::HighlightText);
    }
}
