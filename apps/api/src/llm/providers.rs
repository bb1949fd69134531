//! Provider adapters. Two HTTP shapes cover the closed provider set:
//! token-generation (Hugging Face Inference API) and OpenAI-compatible chat
//! completions (OpenRouter, Groq, OpenAI).
//!
//! Adapters are single-shot: one prompt in, raw text or a typed error out.
//! Retry and fallback live above them, in `retry` and `orchestrator`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompts::LATEX_SYSTEM;
use super::{LlmError, MAX_COMPLETION_TOKENS, TEMPERATURE};

/// Uniform adapter interface the orchestrator depends on.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Turns a prompt into raw completion text, or a typed error.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Token-generation adapter (Hugging Face Inference API)
// ────────────────────────────────────────────────────────────────────────────

pub struct TextGenAdapter {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl TextGenAdapter {
    pub fn new(client: Client, base_url: &str, model: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint: format!("{}/{model}", base_url.trim_end_matches('/')),
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct TextGenRequest<'a> {
    inputs: &'a str,
    parameters: TextGenParameters,
}

#[derive(Debug, Serialize)]
struct TextGenParameters {
    max_new_tokens: u32,
    temperature: f32,
    /// Ask the endpoint for the completion only, not the echoed prompt.
    return_full_text: bool,
}

#[async_trait]
impl CompletionBackend for TextGenAdapter {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&TextGenRequest {
                inputs: prompt,
                parameters: TextGenParameters {
                    max_new_tokens: MAX_COMPLETION_TOKENS,
                    temperature: TEMPERATURE,
                    return_full_text: false,
                },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // 429/503 bodies land here too; the classifier reads transience
            // off the rendered status, so one variant carries both cases.
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let payload: serde_json::Value = response.json().await?;

        // The endpoint answers with either a list of generations or a single
        // object. Unrecognized shapes fall through to a string-coerced dump
        // rather than an error — permissive on purpose, so schema drift
        // degrades to odd output instead of a hard failure.
        let generated = match &payload {
            serde_json::Value::Array(items) => items
                .first()
                .and_then(|item| item.get("generated_text"))
                .and_then(serde_json::Value::as_str),
            other => other.get("generated_text").and_then(serde_json::Value::as_str),
        };

        Ok(match generated {
            Some(text) => text.to_string(),
            None => payload.to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Chat-completion adapter (OpenAI-compatible endpoints)
// ────────────────────────────────────────────────────────────────────────────

/// Parameterized by base URL, model, and credentials; serves OpenRouter,
/// Groq, and OpenAI with one implementation.
pub struct ChatCompletionAdapter {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    extra_headers: Vec<(String, String)>,
}

impl ChatCompletionAdapter {
    pub fn new(
        client: Client,
        base_url: &str,
        model: String,
        api_key: String,
        extra_headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
            api_key,
            extra_headers,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionBackend for ChatCompletionAdapter {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut request = self.client.post(&self.endpoint).bearer_auth(&self.api_key);
        for (name, value) in &self.extra_headers {
            request = request.header(name, value);
        }

        let response = request
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: LATEX_SYSTEM,
                    },
                    ChatMessage {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: TEMPERATURE,
                max_tokens: MAX_COMPLETION_TOKENS,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
