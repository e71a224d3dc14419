use chrono::{DateTime, Utc};

use crate::constants::listing::MAX_VIEW_RETRIES;
use crate::error::AppError;

/// Loading and error state shown alongside a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub loading: bool,
    /// User-facing message of the last failed load
    pub error: Option<String>,
    /// Consecutive failed loads
    pub retry_count: u32,
    pub last_loaded: Option<DateTime<Utc>>,
}

impl ViewState {
    pub fn start_loading(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn finish(&mut self) {
        self.loading = false;
        self.error = None;
        self.retry_count = 0;
        self.last_loaded = Some(Utc::now());
    }

    pub fn fail(&mut self, error: &AppError) {
        self.loading = false;
        self.retry_count += 1;
        self.error = Some(error.user_message());
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether a retry affordance should be offered
    pub fn can_retry(&self) -> bool {
        self.has_error() && self.retry_count < MAX_VIEW_RETRIES
    }
}
