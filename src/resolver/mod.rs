//! Instruction resolution.
//!
//! Converts a free-text instruction plus the extracted document text into
//! an ordered list of typed, span-anchored edit operations. Two tiers
//! implement one [`InstructionResolver`] capability: the LLM tier is tried
//! first and any failure falls through to the deterministic rule-based
//! tier (fail-fast-to-fallback, no retries). Anchoring against the
//! immutable [`DocumentText`] snapshot is shared by both tiers.

pub mod anchor;
pub mod llm;
pub mod rules;

pub use llm::LlmResolver;
pub use rules::RuleBasedResolver;

use crate::document::{BBox, DocumentText};
use crate::error::{EditorError, EditorResult};

/// The kind of edit an instruction describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    ReplaceText,
    ChangeHeading,
    HighlightText,
}

impl EditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReplaceText => "replace",
            Self::ChangeHeading => "change-heading",
            Self::HighlightText => "highlight",
        }
    }
}

/// An edit request as produced by a tier, not yet anchored to a span.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub kind: EditKind,
    /// The text to locate in the document.
    pub target_text: String,
    /// Replacement text, for replace and change-heading requests.
    pub new_text: Option<String>,
    /// Location hint narrowing the search ("the conclusion", ...).
    pub hint: Option<String>,
}

/// Which tier produced an operation. Decides whether humanization applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationSource {
    Llm,
    RuleBased,
}

/// Reference to the anchored target span, resolved against the snapshot.
#[derive(Debug, Clone)]
pub struct SpanRef {
    pub page: usize,
    pub text: String,
    pub bbox: BBox,
    pub font_res: Option<String>,
    pub font_size: f32,
}

/// One anchored, ready-to-apply edit operation.
#[derive(Debug, Clone)]
pub struct ResolvedEdit {
    pub kind: EditKind,
    pub target: SpanRef,
    pub new_text: Option<String>,
    pub source: OperationSource,
    /// Diagnostic note, e.g. when an ambiguous target was tie-broken.
    pub note: Option<String>,
}

/// Why a request was dropped during anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TargetNotFound,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TargetNotFound => "target not found",
        }
    }
}

/// A request that could not be anchored.
#[derive(Debug, Clone)]
pub struct SkippedEdit {
    pub kind: EditKind,
    pub target_text: String,
    pub reason: SkipReason,
}

/// Ordered operations plus the requests that were dropped, with reasons.
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    pub operations: Vec<ResolvedEdit>,
    pub skipped: Vec<SkippedEdit>,
}

/// Strategy for turning an instruction into edit requests.
///
/// Implementations are deterministic given their inputs (the rule-based
/// tier) or defer to an external service (the LLM tier); tests substitute
/// a stub for either.
pub trait InstructionResolver: Send + Sync {
    /// Parses the instruction into unanchored edit requests.
    fn resolve(&self, instruction: &str, doc: &DocumentText) -> EditorResult<Vec<EditRequest>>;

    /// Human-readable tier name, for diagnostics.
    fn name(&self) -> &str;

    /// Source tag attached to operations this tier produces.
    fn source(&self) -> OperationSource;
}

/// Composes a primary resolver over a fallback, switching on any failure.
pub struct FallbackResolver {
    primary: Option<Box<dyn InstructionResolver>>,
    fallback: Box<dyn InstructionResolver>,
}

impl FallbackResolver {
    pub fn new(
        primary: Option<Box<dyn InstructionResolver>>,
        fallback: Box<dyn InstructionResolver>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Resolves and anchors an instruction against the document snapshot.
    ///
    /// Returns [`EditorError::NoOperationsResolved`] when no operation
    /// survives anchoring.
    pub fn resolve(
        &self,
        instruction: &str,
        doc: &DocumentText,
    ) -> EditorResult<ResolutionResult> {
        let (requests, source) = self.requests(instruction, doc);
        let result = anchor::anchor_requests(&requests, doc, source);
        if result.operations.is_empty() {
            return Err(EditorError::NoOperationsResolved);
        }
        Ok(result)
    }

    fn requests(
        &self,
        instruction: &str,
        doc: &DocumentText,
    ) -> (Vec<EditRequest>, OperationSource) {
        if let Some(primary) = &self.primary {
            match primary.resolve(instruction, doc) {
                Ok(requests) if !requests.is_empty() => {
                    return (requests, primary.source());
                }
                Ok(_) => {
                    log::debug!("{} produced no requests, falling back", primary.name());
                }
                Err(e) => {
                    log::warn!("{} failed ({}), falling back", primary.name(), e);
                }
            }
        }
        match self.fallback.resolve(instruction, doc) {
            Ok(requests) => (requests, self.fallback.source()),
            Err(e) => {
                log::warn!("{} failed: {}", self.fallback.name(), e);
                (Vec::new(), self.fallback.source())
            }
        }
    }
}
