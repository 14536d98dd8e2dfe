//! Retry manager with exponential backoff
//!
//! Bounded retry strategy for transient provider failures:
//! - Binary exponential delay with ±25% jitter
//! - Delay capped at 16s
//! - Non-transient errors return immediately

use crate::errors::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Default number of attempts (including the first)
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (1 second)
const BASE_DELAY_MS: u64 = 1000;

/// Maximum delay cap (16 seconds)
const MAX_DELAY_MS: u64 = 16000;

/// Retry manager with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryManager {
    /// Maximum attempts
    max_retries: u32,

    /// Base delay in milliseconds
    base_delay_ms: u64,

    /// Maximum delay cap in milliseconds
    max_delay_ms: u64,

    enable_jitter: bool,
}

impl Default for RetryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryManager {
    pub fn new() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries: max_retries.max(1),
            base_delay_ms,
            max_delay_ms: MAX_DELAY_MS,
            enable_jitter: true,
        }
    }

    /// Execute operation, retrying transient failures
    pub async fn execute_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !e.is_transient() {
                        return Err(e);
                    }

                    attempt += 1;
                    if attempt >= self.max_retries {
                        return Err(e);
                    }

                    let delay = self.calculate_delay(attempt);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying");
                    sleep(delay).await;
                }
            }
        }
    }

    /// Delay before the given retry attempt
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponential_delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let delay_ms = exponential_delay.min(self.max_delay_ms);

        let final_delay = if self.enable_jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((delay_ms as i64) + random_jitter as i64).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NetError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let retry = RetryManager::with_config(3, 1);
        let calls = AtomicU32::new(0);

        let result = retry
            .execute_with_retry(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(NetError::Provider("flaky".to_string()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_with_last_error() {
        let retry = RetryManager::with_config(2, 1);
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry
            .execute_with_retry(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(NetError::Provider("down".to_string()))
            })
            .await;

        assert!(matches!(result, Err(NetError::Provider(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let retry = RetryManager::with_config(5, 1);
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry
            .execute_with_retry(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(NetError::InvalidInput("bad".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_is_capped() {
        let retry = RetryManager::new();
        let delay = retry.calculate_delay(20);
        assert!(delay <= Duration::from_millis(MAX_DELAY_MS + MAX_DELAY_MS / 4));
    }
}
