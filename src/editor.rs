//! High-level editing service.
//!
//! Wires the pipeline together: extract positioned text, resolve the
//! instruction into anchored operations (LLM tier with rule-based
//! fallback), humanize machine-written replacement text, apply, and merge
//! the engine's outcomes with the resolver's skips into one report.

use crate::config::EditorConfig;
use crate::document::{self, DocumentText};
use crate::engine::{EditEngine, EditOutcome, EditReport};
use crate::error::EditorResult;
use crate::humanize::{looks_generated, Humanizer};
use crate::resolver::{
    FallbackResolver, InstructionResolver, LlmResolver, OperationSource, ResolutionResult,
    RuleBasedResolver,
};

/// Prompt-driven PDF editor.
///
/// Holds only read-only configuration; every call is self-contained, so a
/// shared instance can serve concurrent requests without locking.
pub struct PdfEditor {
    config: EditorConfig,
    resolver: FallbackResolver,
    humanizer: Humanizer,
}

impl PdfEditor {
    /// Creates an editor from configuration. The LLM tier is present only
    /// when an API key is configured; resolution falls back to the
    /// rule-based tier either way.
    pub fn new(config: EditorConfig) -> Self {
        let primary = LlmResolver::from_config(&config)
            .map(|r| Box::new(r) as Box<dyn InstructionResolver>);
        let resolver = FallbackResolver::new(primary, Box::new(RuleBasedResolver::new()));
        Self {
            config,
            resolver,
            humanizer: Humanizer::new(),
        }
    }

    /// Applies a natural-language instruction to a PDF.
    ///
    /// Fails only when the input is not a parseable PDF or the instruction
    /// resolves to no operations at all; individual operations that cannot
    /// be applied are reported as skipped in the returned [`EditReport`].
    pub fn edit(&self, pdf_bytes: &[u8], instruction: &str) -> EditorResult<EditReport> {
        let text = document::extract(pdf_bytes, &self.config)?;
        log::info!(
            "extracted {} spans across {} pages",
            text.spans.len(),
            text.page_count
        );

        let mut resolution = self.resolver.resolve(instruction, &text)?;
        log::info!(
            "resolved {} operations ({} skipped at anchoring)",
            resolution.operations.len(),
            resolution.skipped.len()
        );

        self.humanize_replacements(&mut resolution);

        let engine = EditEngine::new(&self.config);
        let (pdf, mut outcomes) = engine.apply(pdf_bytes, &resolution)?;
        outcomes.extend(resolution.skipped.iter().map(EditOutcome::from_skip));

        Ok(EditReport { pdf, outcomes })
    }

    /// Extracts the document text without editing anything.
    pub fn extract_text(&self, pdf_bytes: &[u8]) -> EditorResult<DocumentText> {
        document::extract(pdf_bytes, &self.config)
    }

    /// Rewrites machine-written replacement text in place.
    ///
    /// Only text produced by the LLM tier is eligible, and only when it
    /// trips the generated-text heuristic; rule-based operations carry
    /// text the user typed and are kept verbatim.
    fn humanize_replacements(&self, resolution: &mut ResolutionResult) {
        for op in &mut resolution.operations {
            if op.source != OperationSource::Llm {
                continue;
            }
            if let Some(text) = &op.new_text {
                if looks_generated(text) {
                    let rewritten = self.humanizer.humanize(text);
                    if rewritten != *text {
                        log::debug!("humanized replacement for '{}'", op.target.text);
                        op.new_text = Some(rewritten);
                    }
                }
            }
        }
    }
}
