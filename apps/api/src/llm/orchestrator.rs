//! Provider fallback orchestration.
//!
//! Providers are tried strictly in configured order; the first one to return
//! a usable completion wins and nothing after it runs. Retries happen inside
//! `with_retry`, so a provider only surfaces here once its budget is spent
//! or it fails fatally.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

use super::providers::{ChatCompletionAdapter, CompletionBackend, TextGenAdapter};
use super::retry::{with_retry, RetryPolicy};
use super::{LlmError, ProviderKind};

/// Fixed message shown to callers when every provider failed. The underlying
/// error never reaches the client; it is logged instead.
pub const SERVICE_BUSY_MESSAGE: &str =
    "The service is busy right now. Please try again in a minute.";

/// A provider that was tried and did not produce a usable completion.
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    pub error: LlmError,
}

/// A usable completion plus the trail of providers that failed before it.
#[derive(Debug)]
pub struct Generated {
    pub text: String,
    pub provider: ProviderKind,
    pub failed: Vec<ProviderFailure>,
}

/// Every provider in the configured order was tried; none produced usable
/// text. `last_error` is for logs only, never for the response body.
#[derive(Debug, Error)]
#[error("{}", SERVICE_BUSY_MESSAGE)]
pub struct ProvidersExhausted {
    pub last_error: Option<LlmError>,
}

pub struct GenerationEngine {
    order: Vec<ProviderKind>,
    backends: HashMap<ProviderKind, Box<dyn CompletionBackend>>,
    policy: RetryPolicy,
}

impl GenerationEngine {
    pub fn new(
        order: Vec<ProviderKind>,
        backends: HashMap<ProviderKind, Box<dyn CompletionBackend>>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            order,
            backends,
            policy,
        }
    }

    /// Builds an adapter for every provider holding a credential. Providers
    /// named in the order but left unconfigured are skipped per request.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut backends: HashMap<ProviderKind, Box<dyn CompletionBackend>> = HashMap::new();

        for kind in ProviderKind::ALL {
            let Some(settings) = config.provider(kind) else {
                continue;
            };
            let backend: Box<dyn CompletionBackend> = match kind {
                ProviderKind::HuggingFace => Box::new(TextGenAdapter::new(
                    client.clone(),
                    &settings.base_url,
                    &settings.model,
                    settings.api_key.clone(),
                )),
                ProviderKind::OpenRouter | ProviderKind::Groq | ProviderKind::OpenAi => {
                    Box::new(ChatCompletionAdapter::new(
                        client.clone(),
                        &settings.base_url,
                        settings.model.clone(),
                        settings.api_key.clone(),
                        settings.extra_headers.clone(),
                    ))
                }
            };
            backends.insert(kind, backend);
            info!("provider {kind} configured (model: {})", settings.model);
        }

        Self::new(config.provider_order.clone(), backends, config.retry.clone())
    }

    /// Runs the fallback chain for one prompt.
    pub async fn generate(&self, prompt: &str) -> Result<Generated, ProvidersExhausted> {
        let mut failed: Vec<ProviderFailure> = Vec::new();

        for kind in &self.order {
            let Some(backend) = self.backends.get(kind) else {
                debug!("provider {kind} named in order but not configured, skipping");
                continue;
            };

            info!("requesting completion from {kind}");
            match with_retry(&self.policy, || backend.complete(prompt)).await {
                Ok(raw) => {
                    let text = strip_code_fences(&raw);
                    if text.is_empty() {
                        warn!("{kind} returned an empty completion, falling back");
                        failed.push(ProviderFailure {
                            provider: *kind,
                            error: LlmError::EmptyCompletion,
                        });
                        continue;
                    }
                    info!("completion served by {kind} ({} chars)", text.len());
                    return Ok(Generated {
                        text: text.to_string(),
                        provider: *kind,
                        failed,
                    });
                }
                Err(error) => {
                    warn!("{kind} failed: {error}");
                    failed.push(ProviderFailure {
                        provider: *kind,
                        error,
                    });
                }
            }
        }

        Err(ProvidersExhausted {
            last_error: failed.pop().map(|failure| failure.error),
        })
    }
}

/// Strips one wrapping markdown code fence (``` or ```lang) from model
/// output. Models sometimes fence the document despite the prompt contract.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the optional language hint on the fence line ("latex", "tex", ...).
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    // ── fence stripping ─────────────────────────────────────────────────────

    #[test]
    fn test_strip_fences_with_language_tag() {
        let input = "```latex\n\\documentclass{article}\n```";
        assert_eq!(strip_code_fences(input), "\\documentclass{article}");
    }

    #[test]
    fn test_strip_fences_without_tag() {
        let input = "```\n\\documentclass{article}\n```";
        assert_eq!(strip_code_fences(input), "\\documentclass{article}");
    }

    #[test]
    fn test_strip_fences_leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences("  plain text  "), "plain text");
    }

    #[test]
    fn test_strip_fences_tolerates_missing_trailing_fence() {
        assert_eq!(strip_code_fences("```latex\ndoc"), "doc");
    }

    // ── scripted backends ───────────────────────────────────────────────────

    /// Test backend that serves queued results and counts invocations.
    struct Scripted {
        calls: Arc<AtomicU32>,
        results: Mutex<Vec<Result<String, LlmError>>>,
    }

    #[async_trait]
    impl CompletionBackend for Scripted {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results.lock().unwrap().remove(0)
        }
    }

    fn scripted(
        results: Vec<Result<String, LlmError>>,
    ) -> (Box<dyn CompletionBackend>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let backend = Scripted {
            calls: Arc::clone(&calls),
            results: Mutex::new(results),
        };
        (Box::new(backend), calls)
    }

    fn fatal() -> LlmError {
        LlmError::Api {
            status: 401,
            message: "Invalid API key".to_string(),
        }
    }

    fn transient() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    }

    fn make_engine(
        order: Vec<ProviderKind>,
        backends: Vec<(ProviderKind, Box<dyn CompletionBackend>)>,
    ) -> GenerationEngine {
        GenerationEngine::new(order, backends.into_iter().collect(), RetryPolicy::default())
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_skipped_without_an_attempt() {
        let (groq, _) = scripted(vec![Ok("\\documentclass{article}".to_string())]);
        let engine = make_engine(
            vec![ProviderKind::HuggingFace, ProviderKind::Groq],
            vec![(ProviderKind::Groq, groq)],
        );

        let generated = engine.generate("prompt").await.unwrap();
        assert_eq!(generated.provider, ProviderKind::Groq);
        assert!(generated.failed.is_empty());
    }

    #[tokio::test]
    async fn test_first_success_wins_and_later_providers_never_run() {
        let (hf, _) = scripted(vec![Ok("```latex\n\\documentclass{article}\n```".to_string())]);
        let (groq, groq_calls) = scripted(vec![Ok("unused".to_string())]);
        let engine = make_engine(
            vec![ProviderKind::HuggingFace, ProviderKind::Groq],
            vec![(ProviderKind::HuggingFace, hf), (ProviderKind::Groq, groq)],
        );

        let generated = engine.generate("prompt").await.unwrap();
        assert_eq!(generated.text, "\\documentclass{article}");
        assert_eq!(generated.provider, ProviderKind::HuggingFace);
        assert_eq!(groq_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_completion_soft_fails_to_the_next_provider() {
        let (hf, _) = scripted(vec![Ok("   ".to_string())]);
        let (groq, _) = scripted(vec![Ok("X".to_string())]);
        let engine = make_engine(
            vec![ProviderKind::HuggingFace, ProviderKind::Groq],
            vec![(ProviderKind::HuggingFace, hf), (ProviderKind::Groq, groq)],
        );

        let generated = engine.generate("prompt").await.unwrap();
        assert_eq!(generated.text, "X");
        assert_eq!(generated.failed.len(), 1);
        assert_eq!(generated.failed[0].provider, ProviderKind::HuggingFace);
        assert!(matches!(generated.failed[0].error, LlmError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_all_providers_failing_yields_busy_message_and_last_error() {
        let (hf, _) = scripted(vec![Err(fatal())]);
        let (groq, _) = scripted(vec![Err(LlmError::Api {
            status: 400,
            message: "model not found".to_string(),
        })]);
        let engine = make_engine(
            vec![ProviderKind::HuggingFace, ProviderKind::Groq],
            vec![(ProviderKind::HuggingFace, hf), (ProviderKind::Groq, groq)],
        );

        let exhausted = engine.generate("prompt").await.unwrap_err();
        assert_eq!(exhausted.to_string(), SERVICE_BUSY_MESSAGE);
        match exhausted.last_error {
            Some(LlmError::Api { status: 400, .. }) => {}
            other => panic!("expected the most recent error to be kept, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_is_exhausted_before_falling_back() {
        let (hf, hf_calls) = scripted(vec![
            Err(transient()),
            Err(transient()),
            Err(transient()),
            Err(transient()),
            Err(transient()),
        ]);
        let (groq, _) = scripted(vec![Ok("X".to_string())]);
        let engine = make_engine(
            vec![ProviderKind::HuggingFace, ProviderKind::Groq],
            vec![(ProviderKind::HuggingFace, hf), (ProviderKind::Groq, groq)],
        );

        let generated = engine.generate("prompt").await.unwrap();
        assert_eq!(generated.text, "X");
        assert_eq!(hf_calls.load(Ordering::SeqCst), 5);
        assert_eq!(generated.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_order_entries_try_the_same_provider_again() {
        let (groq, groq_calls) = scripted(vec![Err(fatal()), Ok("X".to_string())]);
        let engine = make_engine(
            vec![ProviderKind::Groq, ProviderKind::Groq],
            vec![(ProviderKind::Groq, groq)],
        );

        let generated = engine.generate("prompt").await.unwrap();
        assert_eq!(generated.text, "X");
        assert_eq!(groq_calls.load(Ordering::SeqCst), 2);
        assert_eq!(generated.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_no_configured_providers_fails_with_no_last_error() {
        let engine = make_engine(vec![ProviderKind::OpenAi], vec![]);

        let exhausted = engine.generate("prompt").await.unwrap_err();
        assert_eq!(exhausted.to_string(), SERVICE_BUSY_MESSAGE);
        assert!(exhausted.last_error.is_none());
    }

    // ── end-to-end over real adapters ───────────────────────────────────────

    #[tokio::test]
    async fn test_fallback_chain_over_http_adapters() {
        use serde_json::json;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        // Hugging Face endpoint answers with a fatal auth error...
        let hf_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/test-model"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
            .mount(&hf_server)
            .await;

        // ...and the chat endpoint serves a fenced document.
        let chat_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {
                    "role": "assistant",
                    "content": "```latex\n\\documentclass{article}\n\\end{document}\n```"
                }}]
            })))
            .mount(&chat_server)
            .await;

        let client = reqwest::Client::new();
        let backends: HashMap<ProviderKind, Box<dyn CompletionBackend>> = [
            (
                ProviderKind::HuggingFace,
                Box::new(TextGenAdapter::new(
                    client.clone(),
                    &format!("{}/models", hf_server.uri()),
                    "test-model",
                    "bad-key".to_string(),
                )) as Box<dyn CompletionBackend>,
            ),
            (
                ProviderKind::Groq,
                Box::new(ChatCompletionAdapter::new(
                    client,
                    &chat_server.uri(),
                    "test-model".to_string(),
                    "test-key".to_string(),
                    Vec::new(),
                )) as Box<dyn CompletionBackend>,
            ),
        ]
        .into_iter()
        .collect();

        let engine = GenerationEngine::new(
            vec![ProviderKind::HuggingFace, ProviderKind::Groq],
            backends,
            RetryPolicy::default(),
        );

        let generated = engine.generate("prompt").await.unwrap();
        assert_eq!(generated.text, "\\documentclass{article}\n\\end{document}");
        assert_eq!(generated.provider, ProviderKind::Groq);
        assert_eq!(generated.failed.len(), 1);
        assert_eq!(generated.failed[0].provider, ProviderKind::HuggingFace);
    }
}
