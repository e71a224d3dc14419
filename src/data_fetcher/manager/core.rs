//! The data manager facade: cache check, source routing, fetch, normalize,
//! cache store, static fallback.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::inflight::{InflightMap, InflightSlot};
use crate::config::Config;
use crate::data_fetcher::api::{
    OutboundRequest, RateLimiter, RequestExecutor, RequestStats, RequestStatsRecorder,
    StaticSource, build_content_url, create_http_client_with_timeout,
};
use crate::data_fetcher::cache::{CacheKey, ResponseCache};
use crate::data_fetcher::models::{ContentType, LoadOptions, NormalizedData};
use crate::data_fetcher::processors::normalize;
use crate::data_fetcher::sources::{HealthMonitor, SourceHealth, SourceKind, SourceSelector};
use crate::error::AppError;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notifications published to domain managers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEvent {
    /// Upstream data for a type changed; cached variants were dropped
    Updated(ContentType),
}

#[derive(Debug)]
struct ManagerInner {
    config: Config,
    executor: RequestExecutor,
    cache: ResponseCache,
    health: HealthMonitor,
    selector: SourceSelector,
    static_source: Option<StaticSource>,
    inflight: InflightMap,
    events: broadcast::Sender<DataEvent>,
}

/// Entry point for every data load.
///
/// Cheap to clone; clones share the cache, health state and request stats.
/// Construct one per application (or per test) and hand it to the domain
/// managers.
#[derive(Debug, Clone)]
pub struct DataManager {
    inner: Arc<ManagerInner>,
}

impl DataManager {
    /// Builds a manager from a validated configuration. Sources start
    /// unhealthy until [`initialize`](Self::initialize) has probed them.
    pub fn new(config: Config) -> Result<Self, AppError> {
        config.validate()?;

        let client = create_http_client_with_timeout(config.http_timeout_seconds)?;
        let executor = RequestExecutor::new(
            client.clone(),
            RateLimiter::new(config.rate_limit_per_second),
            RequestStatsRecorder::new(),
            config.retry_policy(),
        );
        let health = HealthMonitor::new(
            client,
            config.public_api_url.clone(),
            config.internal_api_url.clone(),
            Duration::from_secs(config.health_timeout_seconds),
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(ManagerInner {
                cache: ResponseCache::new(config.cache_capacity),
                selector: SourceSelector::from_config(&config),
                static_source: config.static_source()?,
                inflight: InflightMap::new(),
                executor,
                health,
                events,
                config,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Probes every configured source. Await this before the first load.
    pub async fn initialize(&self) -> SourceHealth {
        let health = self.inner.health.refresh().await;
        info!(
            "Data manager initialized: public={}, internal={}",
            health.public, health.internal
        );
        health
    }

    /// Loads a content type named by string, validating the name first
    pub async fn load_data(
        &self,
        content_type: &str,
        options: LoadOptions,
    ) -> Result<NormalizedData, AppError> {
        let content_type: ContentType = content_type.parse()?;
        self.load(content_type, options).await
    }

    /// Loads normalized data for a type.
    ///
    /// Returns the cached result when present. Otherwise one fetch per key
    /// runs in a background task and concurrent callers for the same key
    /// share its result, including its error. The caller gives up after the
    /// load timeout while the background fetch still completes its cache
    /// write.
    #[instrument(skip(self, options))]
    pub async fn load(
        &self,
        content_type: ContentType,
        options: LoadOptions,
    ) -> Result<NormalizedData, AppError> {
        let options = options.canonical();
        let key = CacheKey::new(content_type, &options);

        if let Some(data) = self.inner.cache.get(&key).await {
            debug!("Cache hit for {key}");
            return Ok(data);
        }

        let deadline = Duration::from_secs(self.inner.config.load_timeout_seconds);
        match tokio::time::timeout(deadline, self.load_uncached(content_type, options, key)).await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("Loading {content_type} exceeded {deadline:?}");
                Err(AppError::network_timeout(format!("load of {content_type}")))
            }
        }
    }

    async fn load_uncached(
        &self,
        content_type: ContentType,
        options: LoadOptions,
        key: CacheKey,
    ) -> Result<NormalizedData, AppError> {
        let lease = match self.inner.inflight.join(&key) {
            InflightSlot::Follower(waiter) => return waiter.wait().await,
            InflightSlot::Leader(lease) => lease,
        };

        let manager = self.clone();
        let task: JoinHandle<Result<NormalizedData, AppError>> = tokio::spawn(async move {
            // a load that finished just before we joined has filled the entry
            let result = match manager.inner.cache.get(lease.key()).await {
                Some(data) => {
                    debug!("Cache filled by concurrent load for {key}");
                    Ok(data)
                }
                None => manager.fetch_and_store(content_type, &options, &key).await,
            };
            lease.complete(&result);
            result
        });

        task.await.map_err(|e| {
            error!("Load task for {content_type} did not complete: {e}");
            AppError::data_unavailable(content_type.as_str())
        })?
    }

    async fn fetch_and_store(
        &self,
        content_type: ContentType,
        options: &LoadOptions,
        key: &CacheKey,
    ) -> Result<NormalizedData, AppError> {
        let cause = match self.fetch_live(content_type, options).await {
            Ok(data) => {
                let data = apply_local_filters(data, options);
                self.inner.cache.set(key.clone(), data.clone()).await;
                return Ok(data);
            }
            Err(e @ (AppError::Validation(_) | AppError::RateLimitExceeded { .. })) => {
                return Err(e);
            }
            Err(e) => e,
        };

        self.load_fallback(content_type, options, key, cause).await
    }

    async fn fetch_live(
        &self,
        content_type: ContentType,
        options: &LoadOptions,
    ) -> Result<NormalizedData, AppError> {
        let health = self.inner.health.current();
        let source = self.inner.selector.resolve(content_type, &health, options)?;
        let url = build_content_url(&source.endpoint, content_type, options)?;
        let request = OutboundRequest::new(url)
            .with_racing_port(self.inner.selector.racing_port_for(content_type, options));

        debug!("Loading {content_type} from {} source", source.kind);
        let payload = self.inner.executor.fetch_json(&request).await?;

        normalize(&payload, content_type).map_err(|e| {
            warn!("Upstream {content_type} payload rejected: {e}");
            AppError::api_malformed_json(e.to_string(), request.url.as_str())
        })
    }

    async fn load_fallback(
        &self,
        content_type: ContentType,
        options: &LoadOptions,
        key: &CacheKey,
        cause: AppError,
    ) -> Result<NormalizedData, AppError> {
        let static_source = match &self.inner.static_source {
            Some(source) if self.inner.config.has_static_fallback(content_type) => source,
            _ => {
                if matches!(cause, AppError::ApiUnavailable { .. }) {
                    warn!("No fallback for {content_type}: {cause}");
                    return Err(cause);
                }
                error!("Failed to load {content_type}: {cause}");
                return Err(AppError::data_unavailable(content_type.as_str()));
            }
        };

        warn!("Live load of {content_type} failed ({cause}), trying static fallback {static_source}");
        let loaded = static_source
            .load(content_type, &self.inner.executor)
            .await
            .and_then(|payload| normalize(&payload, content_type));

        match loaded {
            Ok(data) => {
                let data = apply_local_filters(data, options);
                let ttl = Duration::from_secs(self.inner.config.fallback_cache_ttl_seconds);
                self.inner
                    .cache
                    .set_with_ttl(key.clone(), data.clone(), ttl)
                    .await;
                info!("Serving {} {content_type} records from static fallback", data.len());
                Ok(data)
            }
            Err(fallback_error) => {
                error!(
                    "Failed to load {content_type}: {cause}; static fallback failed: {fallback_error}"
                );
                Err(AppError::data_unavailable(content_type.as_str()))
            }
        }
    }

    /// Drops cached results for one type, or everything. Does not reload.
    pub async fn clear_cache(&self, content_type: Option<ContentType>) -> usize {
        let removed = self.inner.cache.invalidate(content_type).await;
        info!(
            "Cleared {removed} cached entries for {}",
            content_type.map_or("all types", |t| t.as_str())
        );
        removed
    }

    /// Signals that upstream data for a type changed: drops its cache entries
    /// and notifies subscribers, who decide whether to reload
    pub async fn notify_data_changed(&self, content_type: ContentType) {
        self.clear_cache(Some(content_type)).await;
        if self.inner.events.send(DataEvent::Updated(content_type)).is_err() {
            debug!("No subscribers for {content_type} update");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.inner.events.subscribe()
    }

    pub fn request_stats(&self) -> RequestStats {
        self.inner.executor.stats().snapshot()
    }

    /// Latest source health snapshot
    pub fn health(&self) -> SourceHealth {
        self.inner.health.current()
    }

    pub fn has_premium_access(&self) -> bool {
        self.inner.selector.premium_enabled() && self.health().is_healthy(SourceKind::Internal)
    }

    pub fn has_racing_access(&self) -> bool {
        self.inner.selector.has_internal_source() && self.health().is_healthy(SourceKind::Internal)
    }

    /// Starts periodic health probing on the configured interval
    pub fn spawn_health_refresh(&self) -> JoinHandle<()> {
        self.inner
            .health
            .spawn_refresh(Duration::from_secs(self.inner.config.health_refresh_seconds))
    }

    /// Warms the cache for several types concurrently. Returns the record
    /// count or error per type.
    pub async fn preload(
        &self,
        content_types: &[ContentType],
    ) -> Vec<(ContentType, Result<usize, AppError>)> {
        let loads = content_types.iter().map(|&content_type| async move {
            let result = self
                .load(content_type, LoadOptions::default())
                .await
                .map(|data| data.len());
            (content_type, result)
        });
        futures::future::join_all(loads).await
    }

    pub async fn cached_entries(&self) -> usize {
        self.inner.cache.len().await
    }
}

/// Applies id, category and search filters locally, for upstreams that
/// ignore the query string
fn apply_local_filters(data: NormalizedData, options: &LoadOptions) -> NormalizedData {
    let id = options.id.as_deref();
    match data {
        NormalizedData::Content(items) => NormalizedData::Content(
            items
                .into_iter()
                .filter(|item| id.is_none_or(|id| item.id == id))
                .filter(|item| options.matches_item(item))
                .collect(),
        ),
        NormalizedData::Riders(riders) => NormalizedData::Riders(
            riders
                .into_iter()
                .filter(|rider| id.is_none_or(|id| rider.id == id))
                .collect(),
        ),
        other => other,
    }
}
