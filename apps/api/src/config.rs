use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm::retry::RetryPolicy;
use crate::llm::ProviderKind;

/// Fallback order used when `PROVIDER_ORDER` is not set: the hosted
/// inference endpoint first, then the chat APIs by priority.
pub const DEFAULT_PROVIDER_ORDER: &str = "huggingface,openrouter,groq,openai";

/// Application configuration loaded from environment variables once at
/// startup and passed by value into construction — core logic never reads
/// the environment itself.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub provider_order: Vec<ProviderKind>,
    pub retry: RetryPolicy,
    pub huggingface: Option<ProviderConfig>,
    pub openrouter: Option<ProviderConfig>,
    pub groq: Option<ProviderConfig>,
    pub openai: Option<ProviderConfig>,
}

/// Connection settings for one provider. Present only when its API key is
/// set; an absent provider is skipped by the fallback chain.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub extra_headers: Vec<(String, String)>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let raw_order = std::env::var("PROVIDER_ORDER")
            .unwrap_or_else(|_| DEFAULT_PROVIDER_ORDER.to_string());

        Ok(Config {
            port: env_parse("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            provider_order: parse_provider_order(&raw_order)?,
            retry: retry_policy_from_env()?,
            huggingface: std::env::var("HF_API_TOKEN").ok().map(|api_key| ProviderConfig {
                api_key,
                base_url: env_or("HF_BASE_URL", "https://api-inference.huggingface.co/models"),
                model: env_or("HF_MODEL", "mistralai/Mistral-7B-Instruct-v0.2"),
                extra_headers: Vec::new(),
            }),
            openrouter: std::env::var("OPENROUTER_API_KEY").ok().map(|api_key| {
                ProviderConfig {
                    api_key,
                    base_url: env_or("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
                    model: env_or("OPENROUTER_MODEL", "meta-llama/llama-3.3-70b-instruct"),
                    // Attribution headers; OpenRouter uses them for rankings,
                    // they carry no auth.
                    extra_headers: vec![
                        (
                            "HTTP-Referer".to_string(),
                            env_or("OPENROUTER_REFERER", "http://localhost:3000"),
                        ),
                        ("X-Title".to_string(), "Tailor API".to_string()),
                    ],
                }
            }),
            groq: std::env::var("GROQ_API_KEY").ok().map(|api_key| ProviderConfig {
                api_key,
                base_url: env_or("GROQ_BASE_URL", "https://api.groq.com/openai/v1"),
                model: env_or("GROQ_MODEL", "llama-3.3-70b-versatile"),
                extra_headers: Vec::new(),
            }),
            openai: std::env::var("OPENAI_API_KEY").ok().map(|api_key| ProviderConfig {
                api_key,
                base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
                model: env_or("OPENAI_MODEL", "gpt-4-turbo-preview"),
                extra_headers: Vec::new(),
            }),
        })
    }

    /// Settings for one provider, or None when its credential is absent.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        match kind {
            ProviderKind::HuggingFace => self.huggingface.as_ref(),
            ProviderKind::OpenRouter => self.openrouter.as_ref(),
            ProviderKind::Groq => self.groq.as_ref(),
            ProviderKind::OpenAi => self.openai.as_ref(),
        }
    }
}

/// Parses the comma-separated provider order. Unknown names are rejected so
/// a typo cannot silently drop a provider from the fallback chain.
pub fn parse_provider_order(raw: &str) -> Result<Vec<ProviderKind>> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            ProviderKind::parse(name)
                .with_context(|| format!("unknown provider '{name}' in PROVIDER_ORDER"))
        })
        .collect()
}

fn retry_policy_from_env() -> Result<RetryPolicy> {
    let defaults = RetryPolicy::default();
    Ok(RetryPolicy {
        max_attempts: env_parse("RETRY_MAX_ATTEMPTS", defaults.max_attempts)?,
        backoff_base: Duration::from_secs_f64(env_parse(
            "RETRY_BACKOFF_BASE_SECS",
            defaults.backoff_base.as_secs_f64(),
        )?),
        backoff_max: Duration::from_secs_f64(env_parse(
            "RETRY_BACKOFF_MAX_SECS",
            defaults.backoff_max.as_secs_f64(),
        )?),
    })
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
