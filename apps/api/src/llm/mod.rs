/// LLM generation layer — the single point of entry for all model calls in the Tailor API.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// All model interactions MUST go through `GenerationEngine`.
use std::fmt;

use thiserror::Error;

pub mod classify;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod retry;

/// Generation budget for a full one-to-two-page LaTeX resume.
pub const MAX_COMPLETION_TOKENS: u32 = 4000;
/// Fixed sampling temperature across all providers.
pub const TEMPERATURE: f32 = 0.7;
/// Per-call network timeout. Generation calls legitimately run long.
pub const REQUEST_TIMEOUT_SECS: u64 = 90;

/// Error raised by a provider adapter for a single call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

/// The closed set of supported provider backends.
///
/// `HuggingFace` speaks the token-generation shape; the rest are
/// OpenAI-compatible chat-completion endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    HuggingFace,
    OpenRouter,
    Groq,
    OpenAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::HuggingFace,
        ProviderKind::OpenRouter,
        ProviderKind::Groq,
        ProviderKind::OpenAi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Parses a provider name as it appears in `PROVIDER_ORDER`.
    pub fn parse(name: &str) -> Option<ProviderKind> {
        match name.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Some(ProviderKind::HuggingFace),
            "openrouter" => Some(ProviderKind::OpenRouter),
            "groq" => Some(ProviderKind::Groq),
            "openai" => Some(ProviderKind::OpenAi),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
