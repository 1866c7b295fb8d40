//! Retry with exponential backoff and jitter.
//!
//! Attempts are counted in total: a policy with `max_attempts = 3` calls the
//! operation at most three times. Fatal errors stop immediately; a transient
//! error on the final attempt is wrapped in `EngineError::RetriesExhausted`.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::metrics;

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Base delay, doubled after each failed attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Treat unparseable backend output as transient.
    pub retry_parse_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            retry_parse_errors: false,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_retry_parse_errors(mut self, retry: bool) -> Self {
        self.retry_parse_errors = retry;
        self
    }

    /// Whether `error` should be retried under this policy.
    pub fn is_transient(&self, error: &EngineError) -> bool {
        match error {
            EngineError::Backend(e) if e.is_retryable() => true,
            EngineError::Parse(_) => self.retry_parse_errors,
            e if e.is_parse_failure() => self.retry_parse_errors,
            _ => false,
        }
    }

    /// Backoff before the attempt following `failed_attempts` failures,
    /// without jitter.
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(2u32.pow(exponent))
            .min(self.max_delay)
    }

    fn delay_for_attempt(&self, failed_attempts: u32, retry_after_ms: Option<u64>) -> Duration {
        if let Some(hint) = retry_after_ms {
            return Duration::from_millis(hint).min(self.max_delay);
        }

        let delay = self.backoff(failed_attempts);
        let jitter_cap = (delay.as_millis() / 2) as u64;
        let jitter = if jitter_cap > 0 {
            rand::rng().random_range(0..=jitter_cap)
        } else {
            0
        };
        (delay + Duration::from_millis(jitter)).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails fatally, or attempts run out.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut op: F) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => {
                    return RetryResult::Success {
                        value,
                        attempts: attempt,
                    }
                }
                Err(e) if !self.is_transient(&e) => {
                    debug!(operation, attempt, error = %e, "Fatal error, not retrying");
                    return RetryResult::Failed {
                        error: e,
                        attempts: attempt,
                    };
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(operation, attempts = attempt, error = %e, "Retries exhausted");
                    return RetryResult::Failed {
                        error: EngineError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        },
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    let delay = self.delay_for_attempt(attempt, e.retry_after_ms());
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient error, retrying"
                    );
                    metrics::record_retry(operation, e.kind());
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T> {
    Success { value: T, attempts: u32 },
    Failed { error: EngineError, attempts: u32 },
}

impl<T> RetryResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success { .. })
    }

    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryResult::Success { attempts, .. } | RetryResult::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn into_result(self) -> Result<T, EngineError> {
        match self {
            RetryResult::Success { value, .. } => Ok(value),
            RetryResult::Failed { error, .. } => Err(error),
        }
    }
}
