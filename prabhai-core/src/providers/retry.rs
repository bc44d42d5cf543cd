//! Retry policy and executor for resilient provider calls
//!
//! A call is attempted up to `max_attempts` times. The delay before retry
//! `i` (1-indexed) is `initial_delay * backoff_multiplier^(i-1)`; there is no
//! delay before the first attempt and no jitter. Failures that cannot succeed
//! on repetition end the loop early.

use crate::providers::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Reasons a retry policy is rejected at construction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetryPolicyError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("backoff_multiplier must be a finite number greater than 1.0, got {0}")]
    InvalidMultiplier(f64),
}

/// Bounded retry with exponential backoff.
///
/// Built once at startup and shared read-only by every routing call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a validated policy
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: f64,
    ) -> Result<Self, RetryPolicyError> {
        if max_attempts == 0 {
            return Err(RetryPolicyError::ZeroAttempts);
        }
        if !backoff_multiplier.is_finite() || backoff_multiplier <= 1.0 {
            return Err(RetryPolicyError::InvalidMultiplier(backoff_multiplier));
        }

        Ok(Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
        })
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Delay to wait before retry number `retry` (1-indexed).
    ///
    /// `retry == 0` is the first attempt and never waits.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);
        // Float-to-int casts saturate, so huge schedules clamp instead of wrapping.
        Duration::from_nanos(nanos as u64)
    }

    /// Total time slept when every attempt fails with a retryable error
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts)
            .map(|retry| self.delay_before_retry(retry))
            .sum()
    }
}

/// Every attempt of one operation failed
#[derive(Debug, Clone, PartialEq, Error)]
#[error("gave up after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted {
    /// Error from the final attempt, or `DeadlineExceeded` if the deadline
    /// had passed before an attempt could start
    pub last_error: ProviderError,

    /// Number of times the operation was actually invoked
    pub attempts: u32,
}

/// Executor for retry operations
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create a new retry executor with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` under the policy with no deadline
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        self.execute_until(operation_name, None, operation).await
    }

    /// Run `operation` under the policy, starting no attempt after `deadline`.
    ///
    /// The deadline is checked before each attempt and before each backoff
    /// sleep; an attempt already in flight is never interrupted. A backoff
    /// that would cross the deadline ends the schedule with the last
    /// attempt's error.
    pub async fn execute_until<F, Fut, T>(
        &self,
        operation_name: &str,
        deadline: Option<Instant>,
        mut operation: F,
    ) -> Result<T, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.policy.max_attempts;
        let mut attempts = 0;

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(self.deadline_exceeded(operation_name, attempts));
            }

            attempts += 1;
            let error = match operation().await {
                Ok(value) => {
                    debug!(
                        operation = operation_name,
                        attempt = attempts,
                        outcome = "success",
                        "attempt succeeded"
                    );
                    return Ok(value);
                }
                Err(error) => error,
            };

            warn!(
                operation = operation_name,
                attempt = attempts,
                max_attempts,
                outcome = "failure",
                error_kind = error.kind(),
                error = %error,
                "attempt failed"
            );

            if attempts >= max_attempts || !error.is_retryable() {
                error!(
                    operation = operation_name,
                    attempts,
                    max_attempts,
                    retryable = error.is_retryable(),
                    error_kind = error.kind(),
                    "retries exhausted"
                );
                return Err(RetryExhausted {
                    last_error: error,
                    attempts,
                });
            }

            let delay = self.policy.delay_before_retry(attempts);
            // Not past the deadline yet: the schedule ends with the real error.
            if deadline.is_some_and(|d| Instant::now() + delay >= d) {
                error!(
                    operation = operation_name,
                    attempts,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error_kind = error.kind(),
                    "retries exhausted, backoff would cross deadline"
                );
                return Err(RetryExhausted {
                    last_error: error,
                    attempts,
                });
            }

            debug!(
                operation = operation_name,
                next_attempt = attempts + 1,
                delay_ms = delay.as_millis() as u64,
                "backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn deadline_exceeded(&self, operation_name: &str, attempts: u32) -> RetryExhausted {
        error!(
            operation = operation_name,
            attempts,
            error_kind = ProviderError::DeadlineExceeded.kind(),
            "retries exhausted"
        );
        RetryExhausted {
            last_error: ProviderError::DeadlineExceeded,
            attempts,
        }
    }
}
