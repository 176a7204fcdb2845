//! Editor configuration.
//!
//! All tunables live in one explicitly passed structure so the resolver
//! and humanizer stay testable without environment mutation. Environment
//! access is confined to [`EditorConfig::from_env`].

use std::env;
use std::time::Duration;

/// Default chat model used by the LLM resolver tier.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default API endpoint base for the LLM resolver tier.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Read-only configuration shared by every request.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// API key for the external LLM service. `None` disables the LLM tier.
    pub api_key: Option<String>,
    /// Chat model identifier.
    pub model: String,
    /// API base URL, overridable for tests.
    pub api_base: String,
    /// Timeout for the single LLM call. No retries are attempted.
    pub request_timeout: Duration,
    /// Maximum number of document characters sent to the LLM.
    pub excerpt_limit: usize,
    /// A span is a heading when its font size exceeds the page's modal
    /// size by this factor.
    pub heading_size_factor: f32,
    /// Font size used when a span's original size is unknown.
    pub default_font_size: f32,
    /// Highlight annotation color, RGB in 0..=1.
    pub highlight_color: [f32; 3],
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            excerpt_limit: 2000,
            heading_size_factor: 1.2,
            default_font_size: 12.0,
            highlight_color: [1.0, 1.0, 0.0],
        }
    }
}

impl EditorConfig {
    /// Builds a configuration from the process environment.
    ///
    /// Recognized variables: `OPENAI_API_KEY`, `PROMPTPDF_MODEL`,
    /// `PROMPTPDF_API_BASE`, `PROMPTPDF_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        if let Ok(model) = env::var("PROMPTPDF_MODEL") {
            cfg.model = model;
        }
        if let Ok(base) = env::var("PROMPTPDF_API_BASE") {
            cfg.api_base = base;
        }
        if let Some(secs) = env::var("PROMPTPDF_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        cfg
    }

    /// Returns a copy with the LLM tier disabled.
    pub fn without_llm(mut self) -> Self {
        self.api_key = None;
        self
    }
}
