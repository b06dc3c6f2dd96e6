//! Token-bucket admission control for the AniList endpoint.
//!
//! The bucket starts full and refills lazily: every `acquire` first credits
//! `floor(elapsed_minutes * rate)` tokens (capped at capacity), then either
//! consumes one token or sleeps in `60 / rate`-second steps, adding a token
//! per step, until one is available. The mutex guard is held across the
//! sleep so depleted-state waiters drain in queue order.
//!
//! Built on `tokio::time::Instant`, which is monotonic; wall-clock jumps
//! cannot inflate the budget.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

pub struct RateLimiter {
    state: Mutex<Bucket>,
    capacity: u32,
    refill_per_minute: u32,
}

impl RateLimiter {
    pub fn new(capacity: u32, refill_per_minute: u32) -> Self {
        Self {
            state: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_per_minute,
        }
    }

    /// Blocks until a token is available, then consumes it.
    pub async fn acquire(&self) {
        let mut bucket = self.state.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill);
        let refill = (elapsed.as_secs_f64() / 60.0 * f64::from(self.refill_per_minute)) as u32;
        if refill > 0 {
            bucket.tokens = (bucket.tokens + refill).min(self.capacity);
            bucket.last_refill = now;
        }

        while bucket.tokens == 0 {
            let step = Duration::from_secs_f64(60.0 / f64::from(self.refill_per_minute));
            tokio::time::sleep(step).await;
            bucket.tokens += 1;
            bucket.last_refill = Instant::now();
        }

        bucket.tokens -= 1;
    }
}
