//! Fixed-interval throttle between calls to the achievement service

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Token bucket of size one: `acquire` returns at most once per `interval`.
///
/// The first call never waits.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_allowed: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_allowed: None,
        }
    }

    /// Wait until the next slot is free and claim it
    pub async fn acquire(&mut self) {
        if let Some(at) = self.next_allowed {
            sleep_until(at).await;
        }
        self.next_allowed = Some(Instant::now() + self.interval);
    }
}
