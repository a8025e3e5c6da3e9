use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Bounded retries with a fixed pause between attempts. A policy with
/// `max_retries = n` makes at most `n + 1` attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: usize,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Retry a future until it succeeds or attempts run out. Intermediate
    /// errors are dropped; only the last one is returned.
    pub async fn retry<F, Fut, T, E>(&self, operation_name: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;

        loop {
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        warn!(
                            operation = operation_name,
                            attempts = attempt,
                            error = %e,
                            "Operation failed after max retries"
                        );
                        return Err(e);
                    }

                    sleep(self.backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_succeeds_on_last_attempt() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let calls = AtomicUsize::new(0);

        let result: Result<usize, String> = policy
            .retry("flaky", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("attempt {} failed", n)) } else { Ok(n) }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), policy.max_attempts());
    }

    #[tokio::test]
    async fn test_returns_last_error() {
        let policy = RetryPolicy::new(1, Duration::from_millis(1));
        let calls = AtomicUsize::new(0);

        let result: Result<(), String> = policy
            .retry("down", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("attempt {} failed", n))
            })
            .await;

        assert_eq!(result, Err("attempt 2 failed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_is_single_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let result: Result<(), &str> = policy
            .retry("once", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
