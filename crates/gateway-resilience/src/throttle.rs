//! Concurrency throttle.
//!
//! Bounds the number of calls in flight against the upstream API. Callers
//! over the ceiling wait on the semaphore without blocking a thread; the slot
//! is held by an RAII permit, so it comes back on success, error, panic or
//! when the owning future is dropped.

use gateway_core::GatewayError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Throttle configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Maximum concurrent calls
    pub max_concurrent: usize,
}

impl ThrottleConfig {
    /// Default ceiling on in-flight calls.
    pub const DEFAULT_MAX_CONCURRENT: usize = 5;
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_concurrent: Self::DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// Semaphore-backed limit on concurrently executing operations.
///
/// Cloning shares the same slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyThrottle {
    max_concurrent: usize,
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyThrottle {
    /// Create a new throttle
    ///
    /// The ceiling is clamped to `1..=Semaphore::MAX_PERMITS`.
    #[must_use]
    pub fn new(config: ThrottleConfig) -> Self {
        let max_concurrent = config.max_concurrent.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            max_concurrent,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ThrottleConfig::default())
    }

    /// Wait for a free slot.
    ///
    /// # Errors
    /// Returns an error only if the semaphore has been closed.
    pub async fn acquire(&self) -> Result<ThrottlePermit, GatewayError> {
        if self.semaphore.available_permits() == 0 {
            debug!(
                max_concurrent = self.max_concurrent,
                "Throttle full, waiting for a slot"
            );
        }

        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GatewayError::unknown("concurrency throttle closed"))?;

        debug!(in_flight = self.in_flight(), "Throttle slot acquired");
        Ok(ThrottlePermit { _permit: permit })
    }

    /// Run `operation` while holding a slot.
    ///
    /// # Errors
    /// Returns the operation's error, or an error if the throttle is closed.
    pub async fn with_slot<F, Fut, T>(&self, operation: F) -> Result<T, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let _permit = self.acquire().await?;
        operation().await
    }

    /// Ceiling on concurrent operations.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of free slots.
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of operations currently holding a slot.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.max_concurrent
            .saturating_sub(self.semaphore.available_permits())
    }

    /// Get current statistics
    #[must_use]
    pub fn stats(&self) -> ThrottleStats {
        ThrottleStats {
            in_flight: self.in_flight(),
            available_slots: self.available_slots(),
            max_concurrent: self.max_concurrent,
        }
    }
}

impl Default for ConcurrencyThrottle {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// A held throttle slot, released on drop.
#[derive(Debug)]
pub struct ThrottlePermit {
    _permit: OwnedSemaphorePermit,
}

impl Drop for ThrottlePermit {
    fn drop(&mut self) {
        debug!("Throttle slot released");
    }
}

/// Throttle statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleStats {
    /// Operations holding a slot
    pub in_flight: usize,
    /// Free slots
    pub available_slots: usize,
    /// Ceiling
    pub max_concurrent: usize,
}

impl ThrottleStats {
    /// Calculate utilization percentage
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max_concurrent == 0 {
            0.0
        } else {
            self.in_flight as f64 / self.max_concurrent as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::sleep;

    fn throttle(max_concurrent: usize) -> ConcurrencyThrottle {
        ConcurrencyThrottle::new(ThrottleConfig { max_concurrent })
    }

    #[tokio::test]
    async fn test_acquire_release() {
        let throttle = throttle(2);
        assert_eq!(throttle.in_flight(), 0);

        let permit1 = throttle.acquire().await.expect("acquire 1");
        assert_eq!(throttle.in_flight(), 1);

        let permit2 = throttle.acquire().await.expect("acquire 2");
        assert_eq!(throttle.in_flight(), 2);
        assert_eq!(throttle.available_slots(), 0);

        drop(permit1);
        assert_eq!(throttle.in_flight(), 1);

        drop(permit2);
        assert_eq!(throttle.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_slot_released_on_error() {
        let throttle = throttle(1);

        let result: Result<(), GatewayError> = throttle
            .with_slot(|| async { Err(GatewayError::network("reset")) })
            .await;

        assert!(result.is_err());
        assert_eq!(throttle.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_slot_released_on_cancellation() {
        let throttle = throttle(1);
        let gate = Arc::new(Notify::new());

        let handle = {
            let throttle = throttle.clone();
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                throttle
                    .with_slot(|| async move {
                        gate.notified().await;
                        Ok::<_, GatewayError>(())
                    })
                    .await
            })
        };

        while throttle.in_flight() == 0 {
            sleep(Duration::from_millis(5)).await;
        }
        handle.abort();
        let _ = handle.await;

        assert_eq!(throttle.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_waiter_admitted_after_release() {
        let throttle = throttle(1);
        let permit = throttle.acquire().await.expect("acquire");

        let waiter = {
            let throttle = throttle.clone();
            tokio::spawn(async move { throttle.with_slot(|| async { Ok(7) }).await })
        };

        sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(permit);
        assert_eq!(waiter.await.expect("join"), Ok(7));
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_ceiling() {
        let throttle = throttle(3);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..12 {
            let throttle = throttle.clone();
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                throttle
                    .with_slot(|| async move {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        sleep(Duration::from_millis(10)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, GatewayError>(())
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.expect("join").expect("slot");
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(throttle.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_stats() {
        let throttle = throttle(4);
        let _permit = throttle.acquire().await.expect("acquire");

        let stats = throttle.stats();
        assert_eq!(stats.in_flight, 1);
        assert_eq!(stats.available_slots, 3);
        assert!((stats.utilization() - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_zero_ceiling_is_raised() {
        assert_eq!(throttle(0).max_concurrent(), 1);
        assert_eq!(ConcurrencyThrottle::with_defaults().max_concurrent(), 5);
    }

    #[test]
    fn test_oversized_ceiling_is_clamped() {
        let throttle = throttle(usize::MAX);
        assert_eq!(throttle.max_concurrent(), Semaphore::MAX_PERMITS);
        assert_eq!(throttle.in_flight(), 0);
    }
}
