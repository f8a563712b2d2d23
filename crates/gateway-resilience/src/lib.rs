//! # Gateway Resilience
//!
//! Resilience patterns for the gateway client:
//! - Retry policy with exponential backoff and additive jitter
//! - Concurrency throttle bounding in-flight upstream calls

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod retry;
pub mod throttle;

// Re-export main types
pub use retry::{RetryConfig, RetryPolicy};
pub use throttle::{ConcurrencyThrottle, ThrottleConfig, ThrottlePermit, ThrottleStats};
