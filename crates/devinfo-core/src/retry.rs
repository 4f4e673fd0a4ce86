//! Retry logic for BLE operations.
//!
//! Decoding never retries; this module only wraps transport operations whose
//! failures may be transient (timeouts, adapter hiccups, dropped links).
//!
//! # Example
//!
//! ```
//! use devinfo_core::{RetryConfig, with_retry, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::for_read();
//!
//! let value = with_retry(&config, "read_battery", || async {
//!     // Your BLE operation here
//!     Ok::<_, Error>(85u8)
//! }).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 means no retries).
    pub max_retries: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries (for exponential backoff).
    pub max_delay: Duration,
    /// Backoff multiplier (1.0 = constant delay, 2.0 = double each time).
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default backoff with a custom retry count.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// No retries.
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Characteristic reads: a few quick retries.
    pub fn for_read() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Set maximum number of retries.
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set initial delay.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set maximum delay.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set backoff multiplier.
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    /// Delay before retry number `attempt` (0-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay.as_secs_f64());

        let final_delay = if self.jitter {
            // up to 25% extra
            capped_delay * (1.0 + rand::rng().random::<f64>() * 0.25)
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay)
    }
}

/// Execute an async operation, retrying transient failures.
///
/// Non-retryable errors (see [`is_retryable`]) are returned immediately.
/// Once retries are exhausted the last error is returned.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) if attempt < config.max_retries && is_retryable(&e) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "{} failed ({}), attempt {}/{}, retrying in {:?}",
                    operation_name,
                    e,
                    attempt + 1,
                    config.max_retries + 1,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Whether an error may succeed on a later attempt.
pub fn is_retryable(error: &Error) -> bool {
    matches!(
        error,
        Error::Timeout { .. }
            | Error::Bluetooth(_)
            | Error::NotConnected
            | Error::ReadFailed { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceNotFoundReason;
    use devinfo_types::{DecodeError, FieldKind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig::new(max_retries)
            .initial_delay(Duration::from_millis(1))
            .jitter(false)
    }

    #[test]
    fn test_retry_config_presets() {
        assert_eq!(RetryConfig::default().max_retries, 3);
        assert_eq!(RetryConfig::none().max_retries, 0);
        assert_eq!(RetryConfig::for_read().max_retries, 3);
        assert!(RetryConfig::for_read().max_delay < RetryConfig::default().max_delay);
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig::new(5)
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(300))
            .jitter(false);

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        // capped
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(300));
    }

    #[test]
    fn test_delay_jitter_bounds() {
        let config = RetryConfig::new(1).initial_delay(Duration::from_millis(100));
        for _ in 0..20 {
            let delay = config.delay_for_attempt(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(126));
        }
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&Error::timeout("read", Duration::from_secs(1))));
        assert!(is_retryable(&Error::NotConnected));
        assert!(is_retryable(&Error::read_failed("2a29", "busy")));
        assert!(!is_retryable(&Error::device_not_found("test")));
        assert!(!is_retryable(&Error::service_not_found("180a")));
        assert!(!is_retryable(&Error::characteristic_not_found("2a29", 2)));
        assert!(!is_retryable(&Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter)));
        assert!(!is_retryable(&Error::Decode(DecodeError::malformed(
            FieldKind::PnpId,
            7,
            2
        ))));
    }

    #[tokio::test]
    async fn test_with_retry_immediate_success() {
        let result = with_retry(&fast(3), "test", || async { Ok::<_, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_retry_eventual_success() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<i32> = with_retry(&fast(3), "test", || {
            let attempts = Arc::clone(&attempts);
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::read_failed("2a29", "transient"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_all_fail() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<i32> = with_retry(&fast(2), "test", || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::NotConnected)
            }
        })
        .await;

        assert!(matches!(result, Err(Error::NotConnected)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3); // 1 initial + 2 retries
    }

    #[tokio::test]
    async fn test_with_retry_none_runs_once() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<i32> = with_retry(&RetryConfig::none(), "test", || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::NotConnected)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_non_retryable_error() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<i32> = with_retry(&fast(3), "test", || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::service_not_found("180a"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
