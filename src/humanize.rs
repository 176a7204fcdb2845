//! Replacement-text humanization.
//!
//! Rewrites generated replacement text to reduce stylistic tells before it
//! is inserted into the document: a fixed formal-to-casual vocabulary
//! substitution (whole-word, first-letter case preserved) followed by
//! removal of flagged connective phrases at sentence starts. Sentence
//! length variation is advisory only and carries no structural guarantee.
//! The pipeline never fails; at worst the input is returned unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Formal terms and their casual equivalents, applied whole-word.
const VOCABULARY: &[(&str, &str)] = &[
    ("utilizes", "uses"),
    ("utilize", "use"),
    ("demonstrates", "shows"),
    ("demonstrate", "show"),
    ("facilitates", "helps"),
    ("facilitate", "help"),
    ("optimize", "improve"),
    ("leverage", "use"),
    ("comprehensive", "complete"),
    ("methodology", "method"),
];

/// Connective phrases removed when they open a sentence.
const CONNECTIVES: &[&str] = &[
    "it is important to note that",
    "furthermore",
    "moreover",
    "in addition",
    "consequently",
];

/// Markers used by [`looks_generated`] to flag machine-written text.
const INDICATORS: &[&str] = &[
    "demonstrates",
    "showcases",
    "furthermore",
    "moreover",
    "consequently",
    "thus",
    "therefore",
    "in addition",
    "operational efficiency",
    "high levels",
    "significant impact",
    "comprehensive",
    "facilitate",
    "optimize",
    "leverage",
];

static VOCABULARY_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    VOCABULARY
        .iter()
        .map(|(from, to)| {
            let pattern = Regex::new(&format!(r"(?i)\b{}\b", from)).expect("valid vocabulary word");
            (pattern, *to)
        })
        .collect()
});

/// Humanization pipeline with independently toggleable stages.
#[derive(Debug, Clone)]
pub struct Humanizer {
    pub substitute_vocabulary: bool,
    pub strip_connectives: bool,
}

impl Default for Humanizer {
    fn default() -> Self {
        Self {
            substitute_vocabulary: true,
            strip_connectives: true,
        }
    }
}

impl Humanizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites `text` through the enabled stages, in order.
    pub fn humanize(&self, text: &str) -> String {
        let mut out = text.to_string();
        if self.substitute_vocabulary {
            out = substitute_vocabulary(&out);
        }
        if self.strip_connectives {
            out = strip_connectives(&out);
        }
        out
    }
}

/// Heuristic flag for machine-written text: two indicator phrases, or one
/// in anything longer than ten words.
pub fn looks_generated(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    let score = INDICATORS.iter().filter(|i| lower.contains(*i)).count();
    score >= 2 || (text.split_whitespace().count() > 10 && score >= 1)
}

fn substitute_vocabulary(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, replacement) in VOCABULARY_PATTERNS.iter() {
        out = pattern
            .replace_all(&out, |caps: &regex::Captures| {
                preserve_case(&caps[0], replacement)
            })
            .into_owned();
    }
    out
}

/// Copies the case of the matched word's first letter onto the replacement.
fn preserve_case(matched: &str, replacement: &str) -> String {
    if matched.chars().next().is_some_and(|c| c.is_uppercase()) {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

fn strip_connectives(text: &str) -> String {
    sentences(text)
        .into_iter()
        .map(strip_leading_connective)
        .collect()
}

/// Splits on sentence terminators, keeping the terminator and any
/// following whitespace attached to the preceding sentence.
fn sentences(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut boundary = false;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            boundary = true;
        } else if boundary && !c.is_whitespace() {
            parts.push(&text[start..i]);
            start = i;
            boundary = false;
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

fn strip_leading_connective(sentence: &str) -> String {
    let body_start = sentence.len() - sentence.trim_start().len();
    let (lead, body) = sentence.split_at(body_start);
    let lower = body.to_lowercase();

    for phrase in CONNECTIVES {
        if !lower.starts_with(phrase) {
            continue;
        }
        // Word boundary after the phrase, so "moreover" does not eat into
        // a longer word.
        let after = &body[phrase.len()..];
        if after.chars().next().is_some_and(|c| c.is_alphanumeric()) {
            continue;
        }
        let rest = after.trim_start_matches([',', ' ']).trim_start();
        let mut chars = rest.chars();
        return match chars.next() {
            Some(first) => format!("{}{}{}", lead, first.to_uppercase(), chars.as_str()),
            None => lead.to_string(),
        };
    }
    sentence.to_string()
}
