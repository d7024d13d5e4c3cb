//! Retry logic with exponential backoff
//!
//! This module provides a small reusable retry policy shared by the market
//! gateway and the decision client. Callers classify each failure into a
//! [`RetryDirective`], which lets one policy express "never retry this",
//! "retry on the standard schedule", and "retry after this specific wait"
//! (e.g. a rate-limit window suggested by the remote service).

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// What to do with a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDirective {
    /// The error is terminal; return it without retrying
    Halt,

    /// Retry on the policy's exponential backoff schedule
    Backoff,

    /// Retry after a specific wait, overriding the schedule
    BackoffFor(Duration),
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            backoff_multiplier,
        }
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_secs(0),
            max_backoff: Duration::from_secs(0),
            backoff_multiplier: 1.0,
        }
    }

    /// Create a policy with fast retries (for testing)
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }

    /// Calculate backoff duration for a given attempt
    fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        let backoff = Duration::from_millis(backoff_ms as u64);

        // Cap at max backoff
        if backoff > self.max_backoff {
            self.max_backoff
        } else {
            backoff
        }
    }

    /// Execute an async operation with retry logic
    ///
    /// # Arguments
    ///
    /// * `operation_name` - Name of the operation (for logging)
    /// * `classify` - Maps each error to a [`RetryDirective`]
    /// * `operation` - Async operation to execute
    ///
    /// # Returns
    ///
    /// Result of the operation, or the last error if all attempts fail
    pub async fn execute<F, Fut, T, E, C>(
        &self,
        operation_name: &str,
        mut classify: C,
        mut operation: F,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
        C: FnMut(&E) -> RetryDirective,
    {
        let mut attempt = 0;

        loop {
            debug!(
                "Attempt {}/{} for operation: {}",
                attempt + 1,
                self.max_attempts,
                operation_name
            );

            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(
                            "Operation '{}' succeeded after {} retries",
                            operation_name, attempt
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    let directive = classify(&e);
                    if directive == RetryDirective::Halt {
                        debug!(
                            "Operation '{}' failed with non-retryable error: {}",
                            operation_name, e
                        );
                        return Err(e);
                    }

                    if attempt + 1 >= self.max_attempts {
                        warn!(
                            "Operation '{}' failed after {} attempts: {}",
                            operation_name, self.max_attempts, e
                        );
                        return Err(e);
                    }

                    let backoff = match directive {
                        RetryDirective::BackoffFor(wait) => wait,
                        _ => self.backoff_duration(attempt + 1),
                    };
                    warn!(
                        "Operation '{}' failed (attempt {}/{}): {}. Retrying in {:?}",
                        operation_name,
                        attempt + 1,
                        self.max_attempts,
                        e,
                        backoff
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn always_backoff(_: &String) -> RetryDirective {
        RetryDirective::Backoff
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_secs(2));
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_no_retry_policy() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_secs(10), 2.0);

        assert_eq!(policy.backoff_duration(0), Duration::from_secs(0));
        assert_eq!(policy.backoff_duration(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_duration(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_duration(3), Duration::from_millis(400));
        assert_eq!(policy.backoff_duration(4), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(5), 2.0);

        // Should be capped at 5 seconds
        assert!(policy.backoff_duration(10) <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_execute_success_first_try() {
        let policy = RetryPolicy::fast();
        let attempts = Arc::new(AtomicU32::new(0));
        let count = attempts.clone();

        let result = policy
            .execute("test_op", always_backoff, || {
                let count = count.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok::<i32, String>(42)
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_success_after_retry() {
        let policy = RetryPolicy::fast();
        let attempts = Arc::new(AtomicU32::new(0));
        let count = attempts.clone();

        let result = policy
            .execute("test_op", always_backoff, || {
                let count = count.clone();
                async move {
                    let n = count.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 2 {
                        Err("transient".to_string())
                    } else {
                        Ok::<i32, String>(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_execute_all_attempts_fail() {
        let policy = RetryPolicy::fast();
        let attempts = Arc::new(AtomicU32::new(0));
        let count = attempts.clone();

        let result = policy
            .execute("test_op", always_backoff, || {
                let count = count.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, String>("transient".to_string())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_halt_stops_immediately() {
        let policy = RetryPolicy::fast();
        let attempts = Arc::new(AtomicU32::new(0));
        let count = attempts.clone();

        let result = policy
            .execute(
                "test_op",
                |_: &String| RetryDirective::Halt,
                || {
                    let count = count.clone();
                    async move {
                        count.fetch_add(1, Ordering::SeqCst);
                        Err::<i32, String>("terminal".to_string())
                    }
                },
            )
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1); // Should not retry
    }

    #[tokio::test]
    async fn test_execute_honors_suggested_wait() {
        let policy = RetryPolicy::new(
            3,
            Duration::from_secs(30), // schedule wait that would stall the test
            Duration::from_secs(60),
            2.0,
        );
        let attempts = Arc::new(AtomicU32::new(0));
        let count = attempts.clone();

        let start = std::time::Instant::now();
        let result = policy
            .execute(
                "test_op",
                |_: &String| RetryDirective::BackoffFor(Duration::from_millis(5)),
                || {
                    let count = count.clone();
                    async move {
                        let n = count.fetch_add(1, Ordering::SeqCst) + 1;
                        if n < 3 {
                            Err("rate limited".to_string())
                        } else {
                            Ok::<i32, String>(7)
                        }
                    }
                },
            )
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // The suggested 5ms wait was used instead of the 30s schedule
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
