use crate::core::config::ProviderConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How often and how patiently a provider request is retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            retries: config.retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Runs `operation` until it succeeds, fails with an error `is_transient`
    /// rejects, or the retries are used up. Returns the last error.
    pub async fn run<F, Fut, T, E>(
        &self,
        mut operation: F,
        is_transient: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.retries && is_transient(&err) => {
                    attempt += 1;
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying...",
                        attempt,
                        self.retries + 1,
                        err
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(retries: usize) -> RetryPolicy {
        RetryPolicy {
            retries,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors_until_success() {
        let calls = &AtomicUsize::new(0);
        let result: Result<u32, String> = policy(2)
            .run(
                move || async move {
                    match calls.fetch_add(1, Ordering::SeqCst) {
                        0 | 1 => Err("connection reset".to_string()),
                        _ => Ok(7),
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let calls = &AtomicUsize::new(0);
        let result: Result<u32, String> = policy(1)
            .run(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("down".to_string())
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = &AtomicUsize::new(0);
        let result: Result<u32, String> = policy(3)
            .run(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("forbidden".to_string())
                },
                |err: &String| err != "forbidden",
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config() {
        let config = ProviderConfig {
            retries: 4,
            retry_delay_ms: 250,
            ..ProviderConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.retries, 4);
        assert_eq!(policy.delay, Duration::from_millis(250));
    }
}
