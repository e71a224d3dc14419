//! Bounded LRU cache for normalized responses

use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::types::{CacheKey, CachedPayload};
use crate::constants::cache::DEFAULT_CAPACITY;
use crate::data_fetcher::models::{ContentType, NormalizedData};

/// Normalized responses keyed by content type and canonical options
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<LruCache<CacheKey, CachedPayload>>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ResponseCache {
    /// Creates a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached data if present and not expired
    #[instrument(skip(self), fields(cache_key = %key))]
    pub async fn get(&self, key: &CacheKey) -> Option<NormalizedData> {
        let mut cache = self.entries.write().await;

        if let Some(cached_entry) = cache.get(key) {
            if !cached_entry.is_expired() {
                debug!(
                    "Cache hit: key={}, records={}, age={:?}",
                    key,
                    cached_entry.data.len(),
                    cached_entry.cached_at.elapsed()
                );
                return Some(cached_entry.data.clone());
            }
            warn!(
                "Removing expired cache entry: key={}, age={:?}, ttl={:?}",
                key,
                cached_entry.cached_at.elapsed(),
                cached_entry.ttl
            );
            cache.pop(key);
        } else {
            debug!("Cache miss: key={}", key);
        }

        None
    }

    /// Stores data without expiry
    #[instrument(skip(self, data), fields(cache_key = %key))]
    pub async fn set(&self, key: CacheKey, data: NormalizedData) {
        let records = data.len();
        self.entries.write().await.put(key.clone(), CachedPayload::new(data));
        info!("Cached response: key={}, records={}", key, records);
    }

    /// Stores data that expires after `ttl`
    #[instrument(skip(self, data), fields(cache_key = %key))]
    pub async fn set_with_ttl(&self, key: CacheKey, data: NormalizedData, ttl: Duration) {
        let records = data.len();
        self.entries
            .write()
            .await
            .put(key.clone(), CachedPayload::with_ttl(data, ttl));
        info!(
            "Cached response with ttl: key={}, records={}, ttl={:?}",
            key, records, ttl
        );
    }

    /// Removes every entry of one content type, or everything for `None`.
    /// Returns the number of removed entries.
    pub async fn invalidate(&self, content_type: Option<ContentType>) -> usize {
        match content_type {
            Some(content_type) => self.invalidate_prefix(&CacheKey::prefix(content_type)).await,
            None => {
                let mut cache = self.entries.write().await;
                let removed = cache.len();
                cache.clear();
                info!("Cleared response cache: removed={}", removed);
                removed
            }
        }
    }

    /// Removes every entry whose key starts with `prefix`
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut cache = self.entries.write().await;
        let stale: Vec<CacheKey> = cache
            .iter()
            .filter(|(key, _)| key.as_str().starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            cache.pop(key);
        }
        info!(
            "Invalidated cache entries: prefix={}, removed={}",
            prefix,
            stale.len()
        );
        stale.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn capacity(&self) -> usize {
        self.entries.read().await.cap().get()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
