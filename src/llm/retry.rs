// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Retry logic for LLM API calls with jittered backoff
//!
//! The engine's recovery policy is narrow: only rate limits are retried,
//! and only once per call. Everything else propagates to the caller.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::error::{ApiError, MaestroError, Result};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay in milliseconds (exponentially increased)
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    /// Jitter percentage (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            jitter: 0.25,
        }
    }
}

impl RetryConfig {
    /// Calculate delay for a given attempt number
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponential_ms = self.base_delay_ms * 2u64.pow(attempt);
        let capped_ms = exponential_ms.min(self.max_delay_ms);

        let jitter_range = (capped_ms as f64 * self.jitter) as i64;
        let jitter_ms = if jitter_range > 0 {
            rand::rng().random_range(-jitter_range..=jitter_range)
        } else {
            0
        };

        Duration::from_millis((capped_ms as i64 + jitter_ms).max(0) as u64)
    }
}

/// Determine if an error is retryable under the engine's policy
pub fn is_retryable(error: &MaestroError) -> bool {
    matches!(error, MaestroError::Api(ApiError::RateLimited(_)))
}

/// Retry an operation with jittered backoff
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    config: RetryConfig,
    operation_name: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if !is_retryable(&error) || attempt >= config.max_retries {
                    return Err(error);
                }

                let delay = config.calculate_delay(attempt);
                warn!(
                    "{} rate limited (attempt {}/{}), retrying in {:.1}s",
                    operation_name,
                    attempt + 1,
                    config.max_retries,
                    delay.as_secs_f64()
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 5,
            max_delay_ms: 20,
            jitter: 0.0,
        }
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.base_delay_ms, 1000);
    }

    #[test]
    fn test_calculate_delay_no_jitter() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 1000,
            jitter: 0.0,
        };

        assert_eq!(config.calculate_delay(0).as_millis(), 100);
        assert_eq!(config.calculate_delay(1).as_millis(), 200);
        assert_eq!(config.calculate_delay(2).as_millis(), 400);
        // Capped
        assert_eq!(config.calculate_delay(10).as_millis(), 1000);
    }

    #[test]
    fn test_calculate_delay_with_jitter_in_range() {
        let config = RetryConfig {
            max_retries: 1,
            base_delay_ms: 1000,
            max_delay_ms: 16000,
            jitter: 0.5,
        };

        let millis = config.calculate_delay(0).as_millis() as i64;
        assert!((500..=1500).contains(&millis));
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&MaestroError::Api(ApiError::RateLimited(60))));

        assert!(!is_retryable(&MaestroError::Api(ApiError::Timeout)));
        assert!(!is_retryable(&MaestroError::Api(
            ApiError::AuthenticationFailed
        )));
        assert!(!is_retryable(&MaestroError::Api(ApiError::ServerError {
            status: 500,
            message: "boom".to_string(),
        })));
        assert!(!is_retryable(&MaestroError::ToolExecution(
            "nope".to_string()
        )));
    }

    #[tokio::test]
    async fn test_with_retry_success_first_try() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(
            || async {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Ok::<_, MaestroError>(42)
            },
            fast_config(1),
            "test",
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_recovers_from_rate_limit() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(
            || async {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                if count == 0 {
                    Err(MaestroError::Api(ApiError::RateLimited(60)))
                } else {
                    Ok(42)
                }
            },
            fast_config(1),
            "test",
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_timeout() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(
            || async {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(MaestroError::Api(ApiError::Timeout))
            },
            fast_config(3),
            "test",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_retries() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry(
            || async {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(MaestroError::Api(ApiError::RateLimited(1)))
            },
            fast_config(1),
            "test",
        )
        .await;

        assert!(result.is_err());
        // Initial attempt + one retry
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
