//! Generation gateway with per-attempt timeout and bounded retries.
//!
//! Each call makes up to `max_retries + 1` attempts. An attempt that exceeds
//! the timeout is abandoned and counts as failed. Between attempts the gateway
//! sleeps without holding any lock. Once attempts run out, the last failure
//! is returned unchanged; degraded answers are built by the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use campus_core::config::{RetryConfig, TimeoutConfig};
use campus_core::{AppError, AppResult};
use serde::Serialize;
use tracing::instrument;

use crate::client::{AnswerGenerator, GenerationRequest};
use crate::types::GenerationResponse;

/// Backoff schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            exponential_backoff: config.exponential_backoff,
        }
    }
}

impl RetryPolicy {
    /// Total attempts per call.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after `attempts_made` failed attempts (0-indexed).
    ///
    /// `min(base * 2^n, max)` with exponential backoff, `base` otherwise.
    pub fn delay_for(&self, attempts_made: u32) -> Duration {
        if !self.exponential_backoff {
            return self.base_delay;
        }
        let factor = 2u32.checked_pow(attempts_made).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Counters since the gateway was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatewayStats {
    pub calls: u64,
    pub attempts: u64,
    pub retries: u64,
    pub timeouts: u64,
    pub errors: u64,
    /// Calls that failed after using every attempt
    pub exhausted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    calls: AtomicU64,
    attempts: AtomicU64,
    retries: AtomicU64,
    timeouts: AtomicU64,
    errors: AtomicU64,
    exhausted: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub struct LlmGateway {
    generator: Arc<dyn AnswerGenerator>,
    policy: RetryPolicy,
    attempt_timeout: Duration,
    counters: Counters,
}

impl LlmGateway {
    pub fn new(
        generator: Arc<dyn AnswerGenerator>,
        policy: RetryPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            policy,
            attempt_timeout,
            counters: Counters::default(),
        }
    }

    pub fn from_config(
        generator: Arc<dyn AnswerGenerator>,
        retry: &RetryConfig,
        timeout: &TimeoutConfig,
    ) -> Self {
        Self::new(generator, RetryPolicy::from(retry), timeout.llm_timeout())
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn provider_name(&self) -> &str {
        self.generator.provider_name()
    }

    /// Generate an answer, retrying timeouts and errors with backoff.
    #[instrument(skip(self, request), fields(provider = %self.generator.provider_name()))]
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        bump(&self.counters.calls);
        let max_attempts = self.policy.max_attempts();
        let mut last_error = None;

        for attempt in 0..max_attempts {
            bump(&self.counters.attempts);

            let outcome =
                match tokio::time::timeout(self.attempt_timeout, self.generator.generate(request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(AppError::Timeout(format!(
                        "Generation attempt exceeded {}ms",
                        self.attempt_timeout.as_millis()
                    ))),
                };

            let err = match outcome {
                Ok(response) => {
                    tracing::info!(
                        "Generation succeeded on attempt {}/{}",
                        attempt + 1,
                        max_attempts
                    );
                    return Ok(response);
                }
                Err(err) => err,
            };

            if err.is_timeout() {
                bump(&self.counters.timeouts);
            } else {
                bump(&self.counters.errors);
            }

            if attempt + 1 < max_attempts {
                let delay = self.policy.delay_for(attempt);
                tracing::warn!(
                    "Generation attempt {}/{} failed: {}, retrying in {}ms",
                    attempt + 1,
                    max_attempts,
                    err,
                    delay.as_millis()
                );
                bump(&self.counters.retries);
                last_error = Some(err);
                tokio::time::sleep(delay).await;
            } else {
                tracing::warn!(
                    "Generation attempt {}/{} failed: {}",
                    attempt + 1,
                    max_attempts,
                    err
                );
                last_error = Some(err);
            }
        }

        bump(&self.counters.exhausted);
        tracing::error!("Generation failed after {} attempts", max_attempts);
        Err(last_error
            .unwrap_or_else(|| AppError::Llm("No generation attempt was made".to_string())))
    }

    pub fn stats(&self) -> GatewayStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        GatewayStats {
            calls: load(&self.counters.calls),
            attempts: load(&self.counters.attempts),
            retries: load(&self.counters.retries),
            timeouts: load(&self.counters.timeouts),
            errors: load(&self.counters.errors),
            exhausted: load(&self.counters.exhausted),
        }
    }
}
