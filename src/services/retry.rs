//! Bounded retry with exponential backoff for provider calls.

use std::future::Future;
use std::time::Duration;

use crate::config::RetrySettings;
use crate::providers::{ProviderError, Result};

/// Retry policy for transient provider failures.
///
/// Only errors for which [`ProviderError::is_transient`] holds are retried.
/// Permanent errors are returned right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` counts the first call.
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// A policy that makes a single attempt.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Total attempts per call, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the given failed attempt (1-based): doubles each time, capped.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn delay_for(&self, error: &ProviderError, attempt: u32) -> Duration {
        match error {
            ProviderError::RateLimited {
                retry_after_secs: Some(secs),
            } => Duration::from_secs(*secs).min(self.max_delay),
            _ => self.delay_after(attempt),
        }
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(&e, attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_secs(settings.initial_delay_seconds),
            Duration::from_secs(settings.max_delay_seconds),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(5), Duration::from_secs(32));
        assert_eq!(policy.delay_after(6), Duration::from_secs(60));
        assert_eq!(policy.delay_after(40), Duration::from_secs(60));
    }

    #[test]
    fn rate_limit_hint_is_honoured_but_capped() {
        let policy = RetryPolicy::default();
        let hinted = ProviderError::RateLimited {
            retry_after_secs: Some(7),
        };
        assert_eq!(policy.delay_for(&hinted, 1), Duration::from_secs(7));

        let huge = ProviderError::RateLimited {
            retry_after_secs: Some(3600),
        };
        assert_eq!(policy.delay_for(&huge, 1), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = instant(3)
            .run("test", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(ProviderError::Connection("reset".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<()> = instant(3)
            .run("test", || {
                calls.set(calls.get() + 1);
                async {
                    Err(ProviderError::Unavailable {
                        status: 503,
                        body: String::new(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Unavailable { .. })));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = instant(5)
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Err(ProviderError::NotFound("gone".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(ProviderError::NotFound(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn single_attempt_policy() {
        let calls = Cell::new(0);
        let _: Result<()> = RetryPolicy::none()
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Err(ProviderError::Connection("down".to_string())) }
            })
            .await;
        assert_eq!(calls.get(), 1);
    }
}
