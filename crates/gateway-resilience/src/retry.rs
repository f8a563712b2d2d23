//! Retry policy with exponential backoff.
//!
//! Delay before retry `n` (0-indexed) is `base_delay * 2^n` plus a uniform
//! jitter drawn from `[0, max_jitter)`. Whether an error is retried at all is
//! decided by [`GatewayError::is_retryable`].

use gateway_core::GatewayError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Base delay, doubled on every retry
    pub base_delay: Duration,
    /// Upper bound (exclusive) of the additive jitter
    pub max_jitter: Duration,
}

impl RetryConfig {
    /// Default maximum retries.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Default base delay (1 second).
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
    /// Default jitter bound (1 second).
    pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(1000);
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            base_delay: Self::DEFAULT_BASE_DELAY,
            max_jitter: Self::DEFAULT_MAX_JITTER,
        }
    }
}

/// Retry policy implementation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Exponential part of the delay for a given attempt (0-indexed)
    #[must_use]
    pub fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.config.base_delay.saturating_mul(factor)
    }

    /// Calculate delay for a given attempt (0-indexed), jitter included
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let jitter_ms = self.config.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
        };
        self.base_delay_for_attempt(attempt).saturating_add(jitter)
    }

    /// Execute an operation with retry logic
    ///
    /// Runs `operation` once, then up to `max_retries` more times while the
    /// error it returns is retryable. Attempts run strictly one after another.
    ///
    /// # Errors
    /// Returns the first non-retryable error, or the last error once the
    /// retry budget is spent.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(attempt = attempt, "Retry succeeded");
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_retryable() || attempt >= self.config.max_retries {
                        debug!(
                            attempt = attempt,
                            retryable = error.is_retryable(),
                            error = %error,
                            "Giving up"
                        );
                        return Err(error);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error_kind = %error.kind(),
                        error = %error,
                        "Retrying after error"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}
