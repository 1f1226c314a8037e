//! Retry with backoff for fallible async operations.
//!
//! [`Retrier`] runs an operation up to `max_attempts` times, waiting between
//! attempts according to a [`Backoff`]. The wait is preemptible: an optional
//! absolute deadline and a [`CancellationToken`] both cut it short.
//!
//! It is used once at start-up to establish the remote store's connection,
//! and optionally by the remote store to repeat idempotent reads.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Delay policy between attempts.
///
/// Implement this to plug a custom backoff into a [`Retrier`].
pub trait Backoff: Send + Sync + fmt::Debug {
    /// Delay to wait after the given failed attempt (1-indexed).
    fn delay(&self, attempt: u32) -> Duration;
}

/// Backoff strategy for retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    #[default]
    Fixed,
    /// Exponential backoff: base * 2^(attempt - 1)
    Exponential,
    /// Linear backoff: base * attempt
    Linear,
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay between attempts
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(4, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Create a policy with fixed delays.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            strategy: BackoffStrategy::Fixed,
        }
    }

    /// Create a policy with exponential backoff.
    pub fn exponential(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            strategy: BackoffStrategy::Exponential,
        }
    }

    /// Calculate delay for a given attempt number (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let delay = match self.strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                self.base_delay.saturating_mul(factor)
            }
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempt),
        };

        delay.min(self.max_delay.max(self.base_delay))
    }
}

impl Backoff for RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.delay_for_attempt(attempt)
    }
}

/// Why a retried operation did not produce a value.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; carries the error of the last one.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// The deadline passed before an attempt succeeded.
    #[error("deadline exceeded after {attempts} attempts")]
    DeadlineExceeded { attempts: u32, last: Option<E> },

    /// The caller cancelled; no further attempts were made.
    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. }
            | RetryError::DeadlineExceeded { attempts, .. }
            | RetryError::Cancelled { attempts } => *attempts,
        }
    }

    /// The error returned by the last attempt, if any attempt ran.
    pub fn into_last(self) -> Option<E> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::DeadlineExceeded { last, .. } => last,
            RetryError::Cancelled { .. } => None,
        }
    }
}

/// Bounded retry-with-backoff runner.
#[derive(Debug, Clone)]
pub struct Retrier {
    max_attempts: u32,
    backoff: Arc<dyn Backoff>,
}

impl Retrier {
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, backoff: impl Backoff + 'static) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(backoff),
        }
    }

    /// Fixed interval between attempts.
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self::from(RetryPolicy::fixed(max_attempts, interval))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `operation` until it succeeds, attempts run out, the deadline
    /// passes, or `cancel` fires.
    pub async fn retry<T, E, F, Fut>(
        &self,
        operation_name: &str,
        deadline: Option<Instant>,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            attempt += 1;
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(
                            operation = operation_name,
                            attempt,
                            "operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            tracing::warn!(
                operation = operation_name,
                attempt,
                max_attempts = self.max_attempts,
                error = %err,
                "attempt failed"
            );

            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: attempt });
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(RetryError::DeadlineExceeded {
                    attempts: attempt,
                    last: Some(err),
                });
            }
            if attempt >= self.max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let wake = Instant::now() + self.backoff.delay(attempt);
            let deadline_first = deadline.filter(|d| *d <= wake);

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
                _ = tokio::time::sleep_until(deadline_first.unwrap_or(wake)) => {}
            }

            if deadline_first.is_some() {
                return Err(RetryError::DeadlineExceeded {
                    attempts: attempt,
                    last: Some(err),
                });
            }
        }
    }
}

impl From<RetryPolicy> for Retrier {
    fn from(policy: RetryPolicy) -> Self {
        Self::new(policy.max_attempts, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_has_constant_delay() {
        let p = RetryPolicy::fixed(3, Duration::from_millis(10));
        assert_eq!(p.delay_for_attempt(1), Duration::from_millis(10));
        assert_eq!(p.delay_for_attempt(5), Duration::from_millis(10));
        assert_eq!(p.delay_for_attempt(0), Duration::ZERO);
    }

    #[test]
    fn exponential_policy_doubles_and_caps() {
        let p = RetryPolicy::exponential(10, Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(p.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(p.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(p.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(p.delay_for_attempt(4), Duration::from_millis(500));
        assert_eq!(p.delay_for_attempt(40), Duration::from_millis(500));
    }

    #[test]
    fn linear_policy_grows_by_base() {
        let p = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            strategy: BackoffStrategy::Linear,
        };
        assert_eq!(p.delay_for_attempt(3), Duration::from_millis(30));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(Retrier::fixed(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test]
    async fn returns_first_success_without_waiting() {
        let retrier = Retrier::fixed(3, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let out: Result<u32, RetryError<String>> =
            retrier.retry("ok", None, &cancel, || async { Ok(7) }).await;
        assert_eq!(out.unwrap(), 7);
    }

    #[tokio::test]
    async fn cancelled_before_start_makes_no_attempts() {
        let retrier = Retrier::fixed(3, Duration::from_millis(1));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut calls = 0;
        let out: Result<(), RetryError<String>> = retrier
            .retry("never", None, &cancel, || {
                calls += 1;
                async { Ok(()) }
            })
            .await;

        assert!(matches!(out, Err(RetryError::Cancelled { attempts: 0 })));
        assert_eq!(calls, 0);
    }

    #[test]
    fn into_last_exposes_final_error() {
        let e: RetryError<&str> = RetryError::Exhausted {
            attempts: 2,
            last: "boom",
        };
        assert_eq!(e.attempts(), 2);
        assert_eq!(e.into_last(), Some("boom"));
    }
}
