//! Retry with exponential backoff for network calls.
//!
//! Applied explicitly at each call site that talks to the source or the index,
//! never implicitly: the caller names the operation and says which errors are
//! worth retrying.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{error, warn};

/// Backoff schedule for transient failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: usize,
    /// Delay before the first retry. Doubles on every further retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Jittered delays drawn from [`RetryPolicy::schedule`].
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        self.schedule().map(jitter)
    }

    /// Delays before jitter: `initial, 2 * initial, 4 * initial, ...` capped at `max_delay`.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> {
        // ExponentialBackoff starts at factor * base, one doubling ahead of
        // `initial`; halving every step keeps odd millisecond values exact.
        let initial_ms = self.initial_delay.as_millis() as u64;
        ExponentialBackoff::from_millis(2)
            .factor(initial_ms)
            .max_delay(self.max_delay.saturating_mul(2))
            .map(|delay| delay / 2)
            .take(self.max_retries)
    }
}

/// Run `action`, retrying with backoff while `is_retryable` accepts the error.
///
/// Every retry is logged at `warn` and exhaustion at `error`. The error of the
/// last attempt is returned once retries run out or a non-retryable error occurs.
///
/// # Arguments
///
/// * `policy` - Backoff schedule and attempt bound
/// * `operation` - Name used in log lines
/// * `action` - Produces a fresh future for each attempt
/// * `is_retryable` - Whether an error is transient
pub async fn retry_with_backoff<T, E, A, Fut, P>(
    policy: &RetryPolicy,
    operation: &str,
    action: A,
    is_retryable: P,
) -> Result<T, E>
where
    A: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_retries = policy.max_retries;
    let mut attempt = 0usize;

    RetryIf::spawn(policy.delays(), action, |err: &E| {
        if !is_retryable(err) {
            return false;
        }
        attempt += 1;
        if attempt > max_retries {
            error!(
                operation = %operation,
                attempts = attempt,
                error = %err,
                "Retries exhausted"
            );
            return false;
        }
        warn!(
            operation = %operation,
            attempt = attempt,
            max_retries = max_retries,
            error = %err,
            "Transient failure, retrying with backoff"
        );
        true
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn is_transient(err: &TestError) -> bool {
        matches!(err, TestError::Transient)
    }

    fn policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_delays_are_bounded() {
        let delays: Vec<Duration> = policy(6).delays().collect();

        assert_eq!(delays.len(), 6);
        assert!(delays.iter().all(|d| *d <= Duration::from_millis(50)));
        assert_eq!(RetryPolicy::none().delays().count(), 0);
    }

    #[test]
    fn test_schedule_doubles_from_initial_delay() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(101),
            max_delay: Duration::from_millis(500),
        };

        let schedule: Vec<u64> = policy.schedule().map(|d| d.as_millis() as u64).collect();

        assert_eq!(schedule, vec![101, 202, 404, 500, 500]);
    }

    #[test]
    fn test_zero_initial_delay_retries_immediately() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(1),
        };

        assert!(policy.schedule().all(|d| d.is_zero()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_until_success() {
        let calls = AtomicUsize::new(0);

        let result = retry_with_backoff(
            &policy(5),
            "test",
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(42)
                }
            },
            is_transient,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_fatal_errors() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), TestError> = retry_with_backoff(
            &policy(5),
            "test",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            },
            is_transient,
        )
        .await;

        assert!(matches!(result, Err(TestError::Fatal)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), TestError> = retry_with_backoff(
            &policy(3),
            "test",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Transient)
            },
            is_transient,
        )
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
