use std::time::Duration;

use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

/// Single-slot spacing of requests to one upstream.
///
/// [`RateLimiter::wait`] returns once at least `min_interval` has passed since
/// the previous caller was released. Callers queue on a fair mutex, so they are
/// released in the order they called; this is not a token bucket and never
/// allows bursts.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Suspend the calling task until the upstream may be called again.
    pub async fn wait(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(delay = ?(ready_at - now), "Rate limiter delaying request");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_millis(2_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_interval_elapsed() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.wait().await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_released_in_call_order() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(1)));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let start = Instant::now();

        let mut handles = Vec::new();
        for id in 0..3 {
            let limiter = Arc::clone(&limiter);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                limiter.wait().await;
                order.lock().unwrap().push((id, start.elapsed()));
            }));
            // Let the spawned task reach the queue before spawning the next one
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let order = order.lock().unwrap();
        let ids: Vec<_> = order.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert!(order[1].1 >= Duration::from_secs(1));
        assert!(order[2].1 >= Duration::from_secs(2));
    }
}
