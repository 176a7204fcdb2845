//! LLM resolver tier.
//!
//! Sends the instruction plus a condensed document excerpt to an external
//! chat-completions service and parses the structured reply defensively:
//! items with a missing or unrecognized field are discarded, and every
//! transport or parse failure is reported as [`EditorError::LlmUnavailable`]
//! so the fallback wrapper can switch tiers. One request, one timeout, no
//! retries.

use serde::{Deserialize, Serialize};

use super::{EditKind, EditRequest, InstructionResolver, OperationSource};
use crate::config::EditorConfig;
use crate::document::DocumentText;
use crate::error::{EditorError, EditorResult};

const SYSTEM_PROMPT: &str = "You are an expert at parsing PDF editing instructions. \
Given a user request and PDF content, extract specific edit requests.\n\
Action types:\n\
- \"replace\": change specific text\n\
- \"highlight\": add yellow highlighting to text\n\
- \"modify_heading\": change heading text\n\
Return a JSON array of objects with fields: action, target_text, \
replacement_text (for replace/modify_heading), context (optional \
surrounding text to help locate the target). Be precise about the text to find.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// One edit description as returned by the service. Every field is
/// optional so a partially valid reply degrades to dropped items instead
/// of a parse error.
#[derive(Debug, Deserialize)]
struct RawEdit {
    action: Option<String>,
    target_text: Option<String>,
    replacement_text: Option<String>,
    context: Option<String>,
}

/// Resolver tier backed by an external chat-completions service.
pub struct LlmResolver {
    client: reqwest::blocking::Client,
    api_key: String,
    api_base: String,
    model: String,
    excerpt_limit: usize,
}

impl LlmResolver {
    /// Builds the tier from configuration. Returns `None` when no API key
    /// is configured or the HTTP client cannot be constructed, in which
    /// case the caller runs rule-based only.
    pub fn from_config(config: &EditorConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        let client = match reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                log::warn!("failed to build HTTP client for LLM tier: {}", e);
                return None;
            }
        };
        Some(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            excerpt_limit: config.excerpt_limit,
        })
    }

    fn call(&self, instruction: &str, doc: &DocumentText) -> EditorResult<String> {
        let full_text = doc.full_text();
        let excerpt = condense(&full_text, self.excerpt_limit);
        let user_prompt = format!(
            "PDF content (excerpt):\n{}\n\nUser request: {}\n\nParse this into edit requests:",
            excerpt, instruction
        );
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: 0.1,
            max_tokens: 1000,
        };

        let unavailable = |reason: String| EditorError::LlmUnavailable { reason };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| unavailable(e.to_string()))?
            .json::<ChatResponse>()
            .map_err(|e| unavailable(format!("malformed response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| unavailable("response carried no content".to_string()))
    }
}

impl InstructionResolver for LlmResolver {
    fn resolve(&self, instruction: &str, doc: &DocumentText) -> EditorResult<Vec<EditRequest>> {
        let content = self.call(instruction, doc)?;
        let requests = parse_response(&content);
        if requests.is_empty() {
            return Err(EditorError::LlmUnavailable {
                reason: "response contained no usable edit request".to_string(),
            });
        }
        Ok(requests)
    }

    fn name(&self) -> &str {
        "llm"
    }

    fn source(&self) -> OperationSource {
        OperationSource::Llm
    }
}

/// Truncates the document text to bound the request payload.
fn condense(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parses the model reply into edit requests, dropping anything that does
/// not match the constrained schema.
fn parse_response(content: &str) -> Vec<EditRequest> {
    let cleaned = strip_fences(content);
    let items: Vec<RawEdit> = match serde_json::from_str(cleaned) {
        Ok(items) => items,
        Err(e) => {
            log::warn!("discarding unparseable LLM reply: {}", e);
            return Vec::new();
        }
    };

    let mut requests = Vec::new();
    for item in items {
        let Some(kind) = item.action.as_deref().and_then(parse_action) else {
            log::debug!("dropping edit with unrecognized action {:?}", item.action);
            continue;
        };
        let Some(target_text) = item.target_text.filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        let new_text = item.replacement_text.filter(|t| !t.trim().is_empty());
        if matches!(kind, EditKind::ReplaceText | EditKind::ChangeHeading) && new_text.is_none() {
            continue;
        }
        requests.push(EditRequest {
            kind,
            target_text,
            new_text,
            hint: item.context.filter(|c| !c.trim().is_empty()),
        });
    }
    requests
}

fn parse_action(action: &str) -> Option<EditKind> {
    match action {
        "replace" => Some(EditKind::ReplaceText),
        "highlight" => Some(EditKind::HighlightText),
        "modify_heading" | "change_heading" => Some(EditKind::ChangeHeading),
        _ => None,
    }
}

/// Strips a leading/trailing markdown code fence from the reply.
fn strip_fences(content: &str) -> &str {
    let mut trimmed = content.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        trimmed = rest;
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        trimmed = rest;
    }
    if let Some(rest) = trimmed.strip_suffix("```") {
        trimmed = rest;
    }
    trimmed.trim()
}
