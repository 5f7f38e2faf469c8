//! Token bucket pacing outbound gateway requests.
//!
//! Tokens accrue at `refill_rate` per second up to `capacity`; each request
//! takes one. [`RateLimiter::acquire`] sleeps until a token is available.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub capacity: f64,
    /// Tokens per second.
    pub refill_rate: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            capacity: 10.0,
            refill_rate: 5.0,
        }
    }
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

pub struct TokenBucket {
    config: RateLimiterConfig,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: config.capacity,
                last_refill: Instant::now(),
            }),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        // The state is two plain numbers; a poisoned guard is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take `cost` tokens if available.
    pub fn try_acquire(&self, cost: f64) -> bool {
        let mut state = self.lock();
        self.refill(&mut state);
        if state.tokens >= cost {
            state.tokens -= cost;
            true
        } else {
            false
        }
    }

    /// Time until `cost` tokens are available.
    pub fn wait_time(&self, cost: f64) -> Duration {
        let mut state = self.lock();
        self.refill(&mut state);
        let deficit = cost - state.tokens;
        if deficit <= 0.0 || self.config.refill_rate <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(deficit / self.config.refill_rate)
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.config.refill_rate).min(self.config.capacity);
        state.last_refill = now;
    }
}

pub struct RateLimiter {
    bucket: TokenBucket,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            bucket: TokenBucket::new(config),
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.bucket.try_acquire(1.0)
    }

    pub fn wait_time(&self) -> Duration {
        self.bucket.wait_time(1.0)
    }

    /// Wait for and take one token.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            let wait = self.wait_time().max(Duration::from_millis(1));
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limited, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}
