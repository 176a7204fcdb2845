//! Prompt-driven PDF editing library.
//!
//! Turns a natural-language instruction into typed edit operations and
//! applies them to a PDF in place, preserving the surrounding layout.
//! Supported operations are text replacement, heading modification, and
//! yellow highlighting.
//!
//! # Architecture
//!
//! - [`document`]: positioned text extraction from content streams
//! - [`resolver`]: instruction parsing (LLM tier with rule-based fallback)
//!   and anchoring against the extracted text
//! - [`humanize`]: rewriting of machine-written replacement text
//! - [`engine`]: application of anchored operations to the PDF
//! - [`editor`]: the high-level service tying the pipeline together
//! - [`error`]: comprehensive error handling
//!
//! Edits are anchored against an immutable snapshot of the document text
//! before anything is mutated, so operations within one request never
//! invalidate each other's coordinates.
//!
//! # Quick Start
//!
//! ```no_run
//! use promptpdf::{EditorConfig, PdfEditor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let editor = PdfEditor::new(EditorConfig::from_env());
//! let pdf = std::fs::read("report.pdf")?;
//!
//! let report = editor.edit(&pdf, "Change 'Q3 Results' to 'Q3 Financial Results'")?;
//! std::fs::write("edited.pdf", &report.pdf)?;
//! println!("{} applied, {} skipped", report.applied_count(), report.skipped_count());
//! # Ok(())
//! # }
//! ```

// Public API
pub mod config;
pub mod document;
pub mod editor;
pub mod engine;
pub mod error;
pub mod humanize;
pub mod resolver;

// Re-exports for convenient access
pub use config::EditorConfig;
pub use editor::PdfEditor;
pub use engine::{EditOutcome, EditReport, OutcomeStatus};
pub use error::{EditorError, EditorResult};
pub use resolver::{EditKind, EditRequest, InstructionResolver, ResolutionResult};
