//! Cache data structures with optional TTL support

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::data_fetcher::models::{ContentType, LoadOptions, NormalizedData};

/// Cache key derived from a content type and canonical options.
///
/// Renders as `"{type}:{canonical-json}"` so that every variant of one type
/// shares the `"{type}:"` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(content_type: ContentType, options: &LoadOptions) -> Self {
        let params: BTreeMap<String, String> = options.query_pairs().into_iter().collect();
        let canonical = serde_json::to_string(&params).unwrap_or_else(|_| "{}".to_string());
        Self(format!("{}{canonical}", Self::prefix(content_type)))
    }

    pub fn prefix(content_type: ContentType) -> String {
        format!("{}:", content_type.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn content_type(&self) -> Option<ContentType> {
        self.0.split_once(':').and_then(|(ty, _)| ty.parse().ok())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cached normalized payload. Live loads carry no TTL and stay until
/// invalidated; entries seeded from static fallbacks expire.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub data: NormalizedData,
    pub cached_at: Instant,
    pub ttl: Option<Duration>,
}

impl CachedPayload {
    pub fn new(data: NormalizedData) -> Self {
        Self {
            data,
            cached_at: Instant::now(),
            ttl: None,
        }
    }

    pub fn with_ttl(data: NormalizedData, ttl: Duration) -> Self {
        Self {
            data,
            cached_at: Instant::now(),
            ttl: Some(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        let age = self.cached_at.elapsed();
        let is_expired = age > ttl;
        debug!(
            "Cache expiration check: age={:?}, ttl={:?}, is_expired={}",
            age, ttl, is_expired
        );
        is_expired
    }

    /// Remaining lifetime, `None` for entries without a TTL
    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.ttl
            .map(|ttl| ttl.saturating_sub(self.cached_at.elapsed()))
    }
}
