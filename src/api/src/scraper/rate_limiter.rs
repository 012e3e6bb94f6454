//! Request pacing for polite crawling.
//!
//! The site is crawled sequentially; every request waits until at least
//! `interval` (plus a random share of `jitter`) has passed since the previous one.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Minimum-interval rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimiterState>>,
}

struct RateLimiterState {
    next_allowed: Option<Instant>,
    interval: Duration,
    jitter: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `interval_secs` - Minimum delay between two requests
    /// * `jitter_secs` - Upper bound of the random delay added on top
    pub fn new(interval_secs: f64, jitter_secs: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(RateLimiterState {
                next_allowed: None,
                interval: Duration::from_secs_f64(interval_secs.max(0.0)),
                jitter: Duration::from_secs_f64(jitter_secs.max(0.0)),
            })),
        }
    }

    /// Wait for the next request slot. The first call never waits.
    pub async fn acquire(&self) {
        let delay = {
            let mut state = self.state.lock().await;
            let now = Instant::now();

            let delay = match state.next_allowed {
                Some(at) if at > now => at - now,
                _ => Duration::ZERO,
            };

            let spacing = state.interval + state.jitter.mul_f64(rand_delay());
            state.next_allowed = Some(now + delay + spacing);
            delay
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Generate a pseudo-random delay factor (0.0 - 1.0)
fn rand_delay() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new(5.0, 0.0);
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced() {
        let limiter = RateLimiter::new(1.0, 0.0);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_is_bounded() {
        let limiter = RateLimiter::new(1.0, 0.5);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_counts_toward_interval() {
        let limiter = RateLimiter::new(1.0, 0.0);
        limiter.acquire().await;

        tokio::time::sleep(Duration::from_secs(2)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
