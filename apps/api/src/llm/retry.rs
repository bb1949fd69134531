//! Bounded retry with randomized exponential backoff.
//!
//! Implemented once and parameterized by the operation — every provider
//! adapter runs under this exact policy, so no adapter carries its own
//! retry loop.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use super::classify::is_transient;
use super::LlmError;

/// Retry tuning. Identical across all providers.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total call budget, including the first attempt.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_secs(2),
            backoff_max: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Capped exponential schedule: base * 2^(attempt-1), bounded by the cap.
    fn capped_exponential_secs(&self, attempt: u32) -> f64 {
        let exp = self.backoff_base.as_secs_f64() * 2f64.powi(attempt as i32 - 1);
        exp.min(self.backoff_max.as_secs_f64())
    }

    /// Delay before retrying after the given 1-based failed attempt, with a
    /// uniform jitter multiplier in [0.5, 1.5) to spread out retry storms.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        Duration::from_secs_f64(self.capped_exponential_secs(attempt) * jitter)
    }
}

/// Runs `op`, retrying transient failures until the attempt budget is spent.
/// Fatal errors and the final transient error are returned unmodified.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts && is_transient(&error) => {
                let delay = policy.backoff_delay(attempt);
                warn!(
                    "attempt {attempt}/{} failed ({error}), retrying in {:.1}s",
                    policy.max_attempts,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
