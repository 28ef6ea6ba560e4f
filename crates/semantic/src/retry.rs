//! Retry logic with exponential backoff for provider calls.
//!
//! Only errors that classify themselves as transient (see [`Retryable`]) are
//! retried; everything else returns on the first failure so a bad API key does
//! not burn the whole retry budget.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Errors that know whether a retry could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Base delay between retries (doubled on every attempt).
    #[serde(with = "crate::serde_millis", rename = "base_delay_ms")]
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    #[serde(with = "crate::serde_millis", rename = "max_delay_ms")]
    pub max_delay: Duration,
    /// Whether to add random jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::default().with_max_retries(0)
    }
}

/// Result of a retry operation.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (Ok if succeeded, otherwise the last error).
    pub result: Result<T, E>,
    /// Number of attempts made (1 = no retries needed).
    pub attempts: u32,
    /// Total duration spent on all attempts, sleeps included.
    pub total_duration: Duration,
    /// Whether the operation ultimately succeeded.
    pub succeeded: bool,
}

impl<T, E> RetryResult<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent. The closure receives the zero-based attempt number.
///
/// ```
/// use semantic::retry::{execute_with_retry_async, RetryConfig, Retryable};
/// use std::time::Duration;
///
/// struct Flaky;
/// impl Retryable for Flaky {
///     fn is_retryable(&self) -> bool { true }
/// }
///
/// # async fn run() {
/// let config = RetryConfig::default().with_base_delay(Duration::from_millis(1));
/// let result = execute_with_retry_async(&config, |attempt| async move {
///     if attempt == 0 { Err(Flaky) } else { Ok("done") }
/// })
/// .await;
/// assert!(result.succeeded);
/// assert_eq!(result.attempts, 2);
/// # }
/// ```
pub async fn execute_with_retry_async<T, E, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> RetryResult<T, E>
where
    E: Retryable,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let mut attempt = 0u32;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                return RetryResult {
                    result: Ok(value),
                    attempts: attempt + 1,
                    total_duration: start.elapsed(),
                    succeeded: true,
                };
            }
            Err(error) => {
                if attempt >= config.max_retries || !error.is_retryable() {
                    return RetryResult {
                        result: Err(error),
                        attempts: attempt + 1,
                        total_duration: start.elapsed(),
                        succeeded: false,
                    };
                }
                tokio::time::sleep(calculate_delay(config, attempt)).await;
                attempt += 1;
            }
        }
    }
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt`, capped, plus 0-50% jitter.
pub fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let base = config.base_delay.as_millis() as u64;
    let exponential = base.saturating_mul(2_u64.saturating_pow(attempt));
    let delay = exponential.min(config.max_delay.as_millis() as u64);

    if config.jitter && delay > 0 {
        let jitter = fastrand::u64(0..=delay / 2);
        Duration::from_millis(delay + jitter)
    } else {
        Duration::from_millis(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig::default()
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[tokio::test]
    async fn retry_succeeds_eventually() {
        let calls = Cell::new(0);
        let result = execute_with_retry_async(&fast().with_max_retries(3), |_| {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(TestError::Transient)
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert!(result.succeeded);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.into_result().unwrap(), "success");
    }

    #[tokio::test]
    async fn retry_fails_after_max_attempts() {
        let result: RetryResult<(), _> =
            execute_with_retry_async(&fast().with_max_retries(2), |_| async {
                Err(TestError::Transient)
            })
            .await;

        assert!(!result.succeeded);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.into_result().unwrap_err(), TestError::Transient);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let result: RetryResult<(), _> =
            execute_with_retry_async(&fast().with_max_retries(5), |_| async {
                Err(TestError::Fatal)
            })
            .await;

        assert_eq!(result.attempts, 1);
        assert!(!result.succeeded);
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let config = RetryConfig::default()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350))
            .with_jitter(false);

        assert_eq!(calculate_delay(&config, 0), Duration::from_millis(100));
        assert_eq!(calculate_delay(&config, 1), Duration::from_millis(200));
        assert_eq!(calculate_delay(&config, 2), Duration::from_millis(350));
        assert_eq!(calculate_delay(&config, 40), Duration::from_millis(350));
    }

    #[test]
    fn jitter_stays_within_half_the_delay() {
        let config = RetryConfig::default()
            .with_base_delay(Duration::from_millis(100))
            .with_jitter(true);
        for _ in 0..50 {
            let delay = calculate_delay(&config, 0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[test]
    fn config_reads_millisecond_fields() {
        let config: RetryConfig =
            serde_json::from_str(r#"{"max_retries": 1, "base_delay_ms": 20}"#).unwrap();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.base_delay, Duration::from_millis(20));
        assert_eq!(config.max_delay, Duration::from_secs(10));
    }
}
