//! Process-wide cap on in-flight page requests.
//!
//! Only the bulk fetch goes through the limiter; the streaming pipeline is
//! bounded by its fixed worker count instead.

use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::warn;

/// Counting permit pool. Cloning shares the same pool.
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
}

/// Held for the duration of one request; dropping it releases the permit.
pub type RequestPermit = OwnedSemaphorePermit;

impl RequestLimiter {
    /// Capacities above [`Semaphore::MAX_PERMITS`] are clamped to it.
    pub fn new(capacity: usize) -> Self {
        if capacity > Semaphore::MAX_PERMITS {
            warn!(
                requested = capacity,
                max = Semaphore::MAX_PERMITS,
                "Request limiter capacity clamped"
            );
        }
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a permit is free. Fails only if the pool was closed.
    pub async fn acquire(&self) -> Result<RequestPermit, AcquireError> {
        Arc::clone(&self.permits).acquire_owned().await
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let limiter = RequestLimiter::new(2);
        let a = limiter.acquire().await.unwrap();
        let _b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), 0);
        drop(a);
        assert_eq!(limiter.available(), 1);
        assert_eq!(limiter.capacity(), 2);
    }

    #[tokio::test]
    async fn test_caps_concurrency() {
        let limiter = RequestLimiter::new(3);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..12)
            .map(|_| {
                let limiter = limiter.clone();
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let _permit = limiter.acquire().await.unwrap();
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(limiter.available(), 3);
    }

    #[tokio::test]
    async fn test_closed_pool_returns_error() {
        let limiter = RequestLimiter::new(1);
        limiter.permits.close();
        assert!(limiter.acquire().await.is_err());
    }

    #[test]
    fn test_oversized_capacity_is_clamped() {
        let limiter = RequestLimiter::new(usize::MAX);
        assert_eq!(limiter.capacity(), Semaphore::MAX_PERMITS);
        assert_eq!(limiter.available(), Semaphore::MAX_PERMITS);
    }
}
