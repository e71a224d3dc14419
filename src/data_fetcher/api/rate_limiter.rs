//! Sliding window rate limiter for outbound requests.
//!
//! Every outbound API call records itself here before touching the network.
//! Calls beyond the window capacity fail immediately; nothing is queued.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

use crate::constants::rate_limit::WINDOW_MS;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    requests: Arc<RwLock<Vec<Instant>>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` calls per window
    pub fn new(requests_per_second: u32) -> Self {
        Self::with_window(requests_per_second, Duration::from_millis(WINDOW_MS))
    }

    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn prune(&self, requests: &mut Vec<Instant>, now: Instant) {
        if let Some(window_start) = now.checked_sub(self.window) {
            requests.retain(|&time| time > window_start);
        }
    }

    /// Records a request if the window has room.
    ///
    /// Returns true if the request is allowed, false if the limit is reached.
    pub async fn check_and_record(&self) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        self.prune(&mut requests, now);

        if requests.len() < self.limit as usize {
            requests.push(now);
            true
        } else {
            false
        }
    }

    /// Like [`check_and_record`](Self::check_and_record), mapping a rejection
    /// to `RateLimitExceeded`
    pub async fn acquire(&self) -> Result<(), AppError> {
        if self.check_and_record().await {
            Ok(())
        } else {
            let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);
            warn!(
                "Local rate limit reached: limit={}, window={}ms",
                self.limit, window_ms
            );
            Err(AppError::rate_limit_exceeded(self.limit, window_ms))
        }
    }

    pub async fn get_stats(&self) -> RateLimitStats {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        self.prune(&mut requests, now);
        let used = u32::try_from(requests.len()).unwrap_or(u32::MAX);
        let reset_in = requests
            .first()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or_default();

        RateLimitStats {
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            used,
            reset_in,
        }
    }
}

/// Rate limit statistics for the current window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStats {
    pub limit: u32,
    pub remaining: u32,
    pub used: u32,
    /// Time until the oldest recorded request leaves the window
    pub reset_in: Duration,
}
