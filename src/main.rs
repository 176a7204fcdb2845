//! Prompt-driven PDF editing CLI.
//!
//! This binary provides a command-line interface for the promptpdf library,
//! applying natural-language edit instructions to PDF documents with proper
//! error handling and user feedback.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use promptpdf::{EditorConfig, OutcomeStatus, PdfEditor};

/// Prompt-driven PDF editor
///
/// Applies a natural-language edit instruction to a PDF document.
/// By default, performs editing. Use 'extract' subcommand for text extraction.
#[derive(Parser)]
#[command(name = "promptpdf")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input PDF file path
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Natural-language edit instruction
    #[arg(short, long, value_name = "TEXT")]
    prompt: Option<String>,

    /// Skip the language-model tier and use only rule-based parsing
    #[arg(long)]
    no_llm: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract positioned text from a PDF (for debugging and verification)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Edit command handler with dependency injection.
struct EditHandler {
    editor: PdfEditor,
    verbose: bool,
}

impl EditHandler {
    fn new(config: EditorConfig, verbose: bool) -> Self {
        Self {
            editor: PdfEditor::new(config),
            verbose,
        }
    }

    /// Executes an edit operation.
    fn edit(&self, input: &Path, output: &Path, prompt: &str) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
        if prompt.trim().is_empty() {
            anyhow::bail!("Edit instruction is empty. Use --prompt to describe the edit.");
        }

        if self.verbose {
            println!("Input:  {}", input.display());
            println!("Output: {}", output.display());
            println!("Prompt: {}", prompt);
        }

        let pdf = std::fs::read(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;

        let report = self.editor.edit(&pdf, prompt).with_context(|| "Edit failed")?;

        write_atomically(output, &report.pdf)
            .with_context(|| format!("Failed to write to {}", output.display()))?;

        if self.verbose {
            println!("\nEdit Summary:");
            for outcome in &report.outcomes {
                let status = match outcome.status {
                    OutcomeStatus::Applied => "applied",
                    OutcomeStatus::Skipped => "skipped",
                };
                match &outcome.note {
                    Some(note) => println!(
                        "  {} '{}': {} ({})",
                        outcome.kind.as_str(),
                        outcome.target_text,
                        status,
                        note
                    ),
                    None => println!(
                        "  {} '{}': {}",
                        outcome.kind.as_str(),
                        outcome.target_text,
                        status
                    ),
                }
            }
        }

        let applied = report.applied_count();
        let skipped = report.skipped_count();
        if applied > 0 {
            println!(
                "✓ Applied {} operation(s) ({} skipped) → {}",
                applied,
                skipped,
                output.display()
            );
        } else {
            println!("⚠ No operations applied ({} skipped)", skipped);
        }

        Ok(())
    }

    /// Extracts text from a PDF.
    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }

        let pdf = std::fs::read(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let text = self
            .editor
            .extract_text(&pdf)
            .with_context(|| "Text extraction failed")?;
        let full = text.full_text();

        if let Some(output_path) = output {
            write_atomically(output_path, full.as_bytes())
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                full.len(),
                output_path.display()
            );
        } else {
            println!("{}", full);
        }

        Ok(())
    }
}

/// Writes `bytes` to a temporary file in the destination's directory and
/// renames it into place, so a failed write never leaves a truncated file
/// at `path`. The temporary file is removed on any error before the rename.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp.write_all(bytes)?;
    temp.persist(path)?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = if cli.no_llm {
        EditorConfig::from_env().without_llm()
    } else {
        EditorConfig::from_env()
    };
    let handler = EditHandler::new(config, cli.verbose);

    match &cli.command {
        Some(Commands::Extract { input, output }) => {
            handler.extract(input, output.as_deref())?;
        }
        None => {
            // Default: edit mode
            let input = cli
                .input
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--input is required"))?;
            let output = cli
                .output
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--output is required"))?;
            let prompt = cli
                .prompt
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--prompt is required"))?;

            handler.edit(input, output, prompt)?;
        }
    }

    Ok(())
}
