//! Loads in progress, one per cache key. The first caller for a key leads
//! the upstream fetch; callers arriving while it runs follow it and receive
//! the leader's result, success or failure.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::debug;

use crate::data_fetcher::cache::CacheKey;
use crate::data_fetcher::models::NormalizedData;
use crate::error::AppError;

type SharedResult = Option<Result<NormalizedData, AppError>>;
type SlotMap = HashMap<CacheKey, watch::Receiver<SharedResult>>;

#[derive(Debug, Clone, Default)]
pub struct InflightMap {
    slots: Arc<Mutex<SlotMap>>,
}

/// Role handed out by [`InflightMap::join`]
#[derive(Debug)]
pub enum InflightSlot {
    Leader(InflightLease),
    Follower(InflightWaiter),
}

impl InflightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `key`. Exactly one caller per running load
    /// gets the lease; everyone else waits on it.
    pub fn join(&self, key: &CacheKey) -> InflightSlot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(receiver) = slots.get(key) {
            debug!("Joining running load for {key}");
            return InflightSlot::Follower(InflightWaiter {
                key: key.clone(),
                receiver: receiver.clone(),
            });
        }

        let (sender, receiver) = watch::channel(None);
        slots.insert(key.clone(), receiver.clone());
        InflightSlot::Leader(InflightLease {
            key: key.clone(),
            sender,
            receiver,
            slots: Arc::clone(&self.slots),
        })
    }

    /// Keys with a load running
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive right to load one cache key. Dropping it, completed or not,
/// releases the key.
#[derive(Debug)]
pub struct InflightLease {
    key: CacheKey,
    sender: watch::Sender<SharedResult>,
    receiver: watch::Receiver<SharedResult>,
    slots: Arc<Mutex<SlotMap>>,
}

impl InflightLease {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Publishes the load result to every follower and releases the key
    pub fn complete(self, result: &Result<NormalizedData, AppError>) {
        let shared = match result {
            Ok(data) => Ok(data.clone()),
            Err(e) => Err(e.replicate()),
        };
        self.sender.send_replace(Some(shared));
    }
}

impl Drop for InflightLease {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // a newer load may already own the key
        if slots
            .get(&self.key)
            .is_some_and(|receiver| receiver.same_channel(&self.receiver))
        {
            slots.remove(&self.key);
        }
    }
}

/// A caller waiting on another caller's load
#[derive(Debug)]
pub struct InflightWaiter {
    key: CacheKey,
    receiver: watch::Receiver<SharedResult>,
}

impl InflightWaiter {
    /// Waits for the leader's result. A leader that goes away without
    /// publishing one leaves the data unavailable.
    pub async fn wait(mut self) -> Result<NormalizedData, AppError> {
        let unavailable = || {
            AppError::data_unavailable(
                self.key.content_type().map_or(self.key.as_str(), |t| t.as_str()),
            )
        };
        let published = match self.receiver.wait_for(Option::is_some).await {
            Ok(value) => match &*value {
                Some(Ok(data)) => Ok(data.clone()),
                Some(Err(e)) => Err(e.replicate()),
                None => Err(unavailable()),
            },
            Err(_) => Err(unavailable()),
        };
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::models::{ContentType, LoadOptions};
    use std::time::Duration;

    fn key(search: &str) -> CacheKey {
        CacheKey::new(ContentType::Tracks, &LoadOptions::new().with_search(search))
    }

    fn lead(map: &InflightMap, key: &CacheKey) -> InflightLease {
        match map.join(key) {
            InflightSlot::Leader(lease) => lease,
            InflightSlot::Follower(_) => panic!("expected to lead {key}"),
        }
    }

    fn follow(map: &InflightMap, key: &CacheKey) -> InflightWaiter {
        match map.join(key) {
            InflightSlot::Follower(waiter) => waiter,
            InflightSlot::Leader(_) => panic!("expected to follow {key}"),
        }
    }

    #[tokio::test]
    async fn test_follower_receives_leader_data() {
        let map = InflightMap::new();
        let lease = lead(&map, &key("a"));
        assert_eq!(lease.key(), &key("a"));
        let waiter = follow(&map, &key("a"));
        assert_eq!(map.len(), 1);

        let waiting = tokio::spawn(waiter.wait());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        lease.complete(&Ok(NormalizedData::Content(Vec::new())));
        let data = tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(data.is_empty());
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_follower_receives_leader_error() {
        let map = InflightMap::new();
        let lease = lead(&map, &key("a"));
        let waiters: Vec<_> = (0..3).map(|_| follow(&map, &key("a"))).collect();

        lease.complete(&Err(AppError::rate_limit_exceeded(10, 1000)));
        for waiter in waiters {
            let err = waiter.wait().await.unwrap_err();
            assert!(matches!(err, AppError::RateLimitExceeded { limit: 10, .. }));
        }
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_lease_releases_key() {
        let map = InflightMap::new();
        let lease = lead(&map, &key("a"));
        let waiter = follow(&map, &key("a"));

        drop(lease);
        assert!(map.is_empty());
        let err = waiter.wait().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::DataUnavailable { ref content_type } if content_type == "tracks"
        ));

        // the next caller starts a fresh load
        let _again = lead(&map, &key("a"));
    }

    #[tokio::test]
    async fn test_cancelled_follower_leaves_no_entry() {
        let map = InflightMap::new();
        let lease = lead(&map, &key("a"));
        let waiter = follow(&map, &key("a"));

        let timed_out = tokio::time::timeout(Duration::from_millis(10), waiter.wait()).await;
        assert!(timed_out.is_err());
        assert_eq!(map.len(), 1);

        lease.complete(&Ok(NormalizedData::Content(Vec::new())));
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_stale_lease_keeps_newer_entry() {
        let map = InflightMap::new();
        let first = lead(&map, &key("a"));
        map.slots.lock().unwrap().remove(&key("a"));
        let second = lead(&map, &key("a"));

        drop(first);
        assert_eq!(map.len(), 1);
        drop(second);
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let map = InflightMap::new();
        let _a = lead(&map, &key("a"));
        let _b = lead(&map, &key("b"));
        assert_eq!(map.len(), 2);
    }
}
