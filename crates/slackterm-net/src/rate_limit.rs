//! Token-bucket admission control for outbound API calls.
//!
//! Every remote call passes through [`RateLimiter::acquire`], which never
//! fails: it only delays the caller until a token is available.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use slackterm_shared::constants::{RATE_LIMIT_INTERVAL_MS, RATE_LIMIT_TOKENS};

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    /// Add one token per whole elapsed interval. The refill marker only
    /// moves when tokens were actually added, so partial intervals carry
    /// over to the next call.
    fn refill(&mut self, capacity: u32, interval: Duration) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_refill);
        let to_add = elapsed.as_nanos() / interval.as_nanos();

        if to_add > 0 {
            let to_add = u32::try_from(to_add).unwrap_or(u32::MAX);
            self.tokens = self.tokens.saturating_add(to_add).min(capacity);
            self.last_refill = now;
        }
    }
}

/// Shared token bucket. Cloning yields another handle to the same bucket.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<TokenBucket>>,
    capacity: u32,
    refill_interval: Duration,
}

impl RateLimiter {
    /// Create a full bucket of `capacity` tokens refilling one token per
    /// `refill_interval`.
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        let capacity = capacity.max(1);
        let refill_interval = refill_interval.max(Duration::from_millis(1));
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket::new(capacity))),
            capacity,
            refill_interval,
        }
    }

    /// Wait until a token is available, then consume it.
    ///
    /// When the bucket is empty the caller sleeps for exactly one refill
    /// interval with the lock released, then takes a fresh token
    /// unconditionally so that contended callers always make progress.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(self.capacity, self.refill_interval);

        if bucket.tokens == 0 {
            drop(bucket);
            debug!(
                wait_ms = self.refill_interval.as_millis() as u64,
                "Rate limit bucket empty, waiting"
            );
            tokio::time::sleep(self.refill_interval).await;

            bucket = self.bucket.lock().await;
            bucket.tokens = 1;
            bucket.last_refill = Instant::now();
        }

        bucket.tokens -= 1;
    }

    /// Tokens currently in the bucket, without refilling.
    pub async fn available(&self) -> u32 {
        self.bucket.lock().await.tokens
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(
            RATE_LIMIT_TOKENS,
            Duration::from_millis(RATE_LIMIT_INTERVAL_MS),
        )
    }
}
