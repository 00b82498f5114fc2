//! Bounded retry with exponential backoff and jitter
//!
//! Used at startup for connections to external collaborators (Redis, HTTP
//! services). Runtime failures are not retried here; the transport's
//! redelivery policy governs those.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Retry error types
#[derive(Error, Debug)]
pub enum RetryError {
    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded after {attempts} tries: {last_error}")]
    MaxAttemptsExceeded { attempts: u32, last_error: String },
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts (including the first)
    pub max_attempts: u32,
    /// Initial delay between attempts
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Backoff multiplier for exponential delay
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Compute the delay before the given (1-based) attempt
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self
            .initial_delay
            .as_millis() as f64
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let mut delay_ms = exp.min(self.max_delay.as_millis() as f64);

        if self.jitter {
            // Up to 20% random jitter to avoid thundering herds
            let jitter = rand::thread_rng().gen_range(0.0..0.2) * delay_ms;
            delay_ms += jitter;
        }

        Duration::from_millis(delay_ms as u64)
    }
}

/// Run `operation` with bounded retries according to `policy`.
///
/// `what` names the operation for log messages.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    what: &str,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_error = String::new();

    for attempt in 1..=policy.max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", what, attempt);
                }
                return Ok(value);
            },
            Err(e) => {
                last_error = e.to_string();
                if attempt < policy.max_attempts {
                    let delay = policy.delay_for_attempt(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        what, attempt, policy.max_attempts, last_error, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            },
        }
    }

    Err(RetryError::MaxAttemptsExceeded {
        attempts: policy.max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let policy = RetryPolicy::default();
        let result: Result<i32, RetryError> =
            retry_with_backoff(&policy, "noop", || async { Ok::<_, String>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&policy, "flaky", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("not yet".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        let result: Result<(), RetryError> =
            retry_with_backoff(&policy, "doomed", || async { Err("nope".to_string()) }).await;
        match result {
            Err(RetryError::MaxAttemptsExceeded { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
