//! Outbound request counters, kept per data manager for observability

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{AppError, ErrorKind};

/// Snapshot of request counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,
    /// Calls rejected by the local rate limiter
    pub rate_limited: u64,
    pub last_request_at: Option<DateTime<Utc>>,
}

impl RequestStats {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total as f64
    }
}

/// Shared recorder; clones update the same counters
#[derive(Debug, Clone, Default)]
pub struct RequestStatsRecorder {
    inner: Arc<Mutex<RequestStats>>,
}

impl RequestStatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, f: impl FnOnce(&mut RequestStats)) {
        let mut stats = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut stats);
    }

    pub fn record_attempt(&self) {
        self.update(|stats| {
            stats.total += 1;
            stats.last_request_at = Some(Utc::now());
        });
    }

    pub fn record_success(&self) {
        self.update(|stats| stats.successful += 1);
    }

    pub fn record_failure(&self, error: &AppError) {
        let kind = error.kind();
        self.update(|stats| {
            stats.failed += 1;
            *stats.errors_by_kind.entry(kind).or_insert(0) += 1;
        });
    }

    pub fn record_rate_limited(&self) {
        self.update(|stats| stats.rate_limited += 1);
    }

    pub fn snapshot(&self) -> RequestStats {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
