// src/retry/strategy.rs

use crate::config::RetryConfig;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error};

/// How often and how far apart an operation is attempted.
///
/// `max_attempts == None` retries forever; there is no exponential growth,
/// every failed attempt is followed by the same `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn forever(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts),
        }
    }

    fn exhausted(&self, attempt: u32) -> bool {
        matches!(self.max_attempts, Some(max) if attempt >= max)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::forever(config.delay())
    }
}

/// Error returned once a bounded policy runs out of attempts.
#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last: E,
}

#[derive(Debug, Clone)]
pub struct RetryStrategy {
    policy: RetryPolicy,
}

impl RetryStrategy {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Execute `f` until it succeeds or the policy is exhausted.
    ///
    /// Every failure is logged at error level together with `operation`.
    pub async fn execute<F, Fut, T, E>(
        &self,
        operation: &str,
        mut f: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "succeeded after retrying");
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if self.policy.exhausted(attempt) {
                        error!(
                            operation,
                            attempt,
                            "unable to {} due to {}, giving up",
                            operation,
                            error
                        );
                        return Err(RetryError {
                            attempts: attempt,
                            last: error,
                        });
                    }

                    error!(
                        operation,
                        attempt,
                        "unable to {} due to {}, trying again after {:?}",
                        operation,
                        error,
                        self.policy.delay
                    );

                    sleep(self.policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_failures() {
        let strategy = RetryStrategy::new(RetryPolicy::forever(Duration::from_secs(5)));
        let counter = AtomicU32::new(0);
        let started = Instant::now();

        let result = strategy
            .execute("validate stage", || async {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err("Temporary failure")
                } else {
                    Ok("Success")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "Success");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_sleep() {
        let strategy = RetryStrategy::new(RetryPolicy::forever(Duration::from_secs(5)));
        let started = Instant::now();

        let result: Result<u8, RetryError<&str>> =
            strategy.execute("validate stage", || async { Ok(7) }).await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_max_attempts() {
        let strategy = RetryStrategy::new(RetryPolicy::bounded(2, Duration::from_millis(10)));
        let counter = AtomicU32::new(0);

        let result: Result<(), _> = strategy
            .execute("ping", || async {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("Always fails")
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 2);
        assert_eq!(err.last, "Always fails");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_policy_keeps_going() {
        let strategy = RetryStrategy::new(RetryPolicy::forever(Duration::from_secs(1)));
        let counter = AtomicU32::new(0);

        let result = strategy
            .execute("validate stage", || async {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 50 {
                    Err("still down")
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 51);
    }
}
