//! Token bucket pacer.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::Pacer;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Classic token bucket: `capacity` tokens, one token added every
/// `interval`. Starts full, so the first `capacity` acquisitions are
/// immediate.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    interval: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(capacity: u32, interval: Duration) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            interval,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// One start per `interval`, no burst.
    pub fn per_interval(interval: Duration) -> Self {
        Self::new(1, interval)
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        if self.interval.is_zero() {
            state.tokens = self.capacity;
            state.last_refill = now;
            return;
        }
        let elapsed = now.saturating_duration_since(state.last_refill);
        let added = elapsed.as_secs_f64() / self.interval.as_secs_f64();
        state.tokens = (state.tokens + added).min(self.capacity);
        state.last_refill = now;
    }
}

#[async_trait]
impl Pacer for TokenBucket {
    async fn acquire(&self) {
        // Held across the sleep so waiters are served in order.
        let mut state = self.state.lock().await;
        self.refill(&mut state, Instant::now());

        if state.tokens < 1.0 {
            let missing = 1.0 - state.tokens;
            let wait = self.interval.mul_f64(missing);
            debug!("Pacing: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
            self.refill(&mut state, Instant::now());
        }

        state.tokens = (state.tokens - 1.0).max(0.0);
    }
}
