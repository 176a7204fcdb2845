//! Error types for the prompt-driven PDF editor.
//!
//! Errors are categorized by source. Only document-level failures
//! (unparseable input, nothing resolved) propagate to callers; failures
//! with a defined fallback are absorbed where they occur.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Comprehensive error type for all editing operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The input byte stream could not be parsed as a PDF. Fatal for the request.
    #[error("cannot parse input as a PDF document: {reason}")]
    CorruptDocument { reason: String },

    /// The instruction matched nothing in either resolver tier.
    ///
    /// Surfaced to the caller so the instruction can be rephrased.
    #[error("no edit operations could be resolved from the instruction")]
    NoOperationsResolved,

    /// The external language-model service failed or is not configured.
    ///
    /// Recovered internally by the rule-based tier; never surfaced to callers.
    #[error("language model service unavailable: {reason}")]
    LlmUnavailable { reason: String },

    /// Error occurred while reading or writing files.
    #[error("IO error for path '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// Error occurred during PDF processing.
    #[error("PDF processing error{}: {message}", page.map(|p| format!(" on page {}", p)).unwrap_or_default())]
    PdfProcessing {
        message: String,
        page: Option<usize>,
    },

    /// Invalid configuration or parameters.
    #[error("invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },
}

impl EditorError {
    /// Wraps a load failure.
    pub(crate) fn corrupt(err: impl std::fmt::Display) -> Self {
        Self::CorruptDocument {
            reason: err.to_string(),
        }
    }

    /// Wraps a processing failure, optionally tied to a page.
    pub(crate) fn pdf(message: impl Into<String>, page: Option<usize>) -> Self {
        Self::PdfProcessing {
            message: message.into(),
            page,
        }
    }
}
