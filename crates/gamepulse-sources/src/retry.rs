//! Fixed-delay retry for upstream calls.
//!
//! Unlike an exponential schedule, every retry waits the same configured
//! delay. Non-retriable errors (see [`SourceError::is_retriable`]) end the
//! loop immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Single attempt, no waiting.
    #[must_use]
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Result of a retried operation plus the number of attempts that failed.
#[derive(Debug)]
pub struct Attempted<T> {
    pub outcome: Result<T, SourceError>,
    pub failures: u32,
}

/// Runs `operation` until it succeeds, hits a non-retriable error, or the
/// policy's attempts are used up.
pub async fn retry_fixed<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut operation: F,
) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let attempts = policy.attempts.max(1);
    let mut failures = 0u32;
    loop {
        match operation().await {
            Ok(value) => {
                return Attempted {
                    outcome: Ok(value),
                    failures,
                }
            }
            Err(err) => {
                failures += 1;
                tracing::warn!(
                    what,
                    attempt = failures,
                    attempts,
                    error = %err,
                    "upstream call failed"
                );
                if !err.is_retriable() || failures >= attempts {
                    return Attempted {
                        outcome: Err(err),
                        failures,
                    };
                }
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn unavailable() -> SourceError {
        SourceError::UnexpectedStatus {
            source_name: "test".to_string(),
            status: 503,
        }
    }

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let attempted = retry_fixed(policy(3), "test", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, SourceError>(42)
            }
        })
        .await;
        assert_eq!(attempted.outcome.unwrap(), 42);
        assert_eq!(attempted.failures, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let attempted = retry_fixed(policy(3), "test", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, SourceError>(unavailable())
            }
        })
        .await;
        assert!(attempted.outcome.is_err());
        assert_eq!(attempted.failures, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let attempted = retry_fixed(policy(3), "test", || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(unavailable())
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(attempted.outcome.unwrap(), 7);
        assert_eq!(attempted.failures, 1);
    }

    #[tokio::test]
    async fn does_not_retry_parse_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let attempted = retry_fixed(policy(3), "test", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, SourceError>(SourceError::parse("test", "bad json"))
            }
        })
        .await;
        assert!(attempted.outcome.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let attempted = retry_fixed(policy(0), "test", || async { Ok::<_, SourceError>(()) }).await;
        assert!(attempted.outcome.is_ok());
    }
}
