//! Source liveness probing.
//!
//! Probe results are published as immutable [`SourceHealth`] snapshots over a
//! `watch` channel. Readers always see a complete snapshot and never hold a
//! lock across I/O.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::data_fetcher::api::build_health_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Public,
    Internal,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Public => "public",
            SourceKind::Internal => "internal",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health flags for both sources. Sources that were never probed are
/// unhealthy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceHealth {
    pub public: bool,
    pub internal: bool,
    /// Region reported by the internal source
    pub region: Option<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

impl SourceHealth {
    pub fn is_healthy(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Public => self.public,
            SourceKind::Internal => self.internal,
        }
    }

    pub fn is_probed(&self) -> bool {
        self.checked_at.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

/// Result of probing one endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub healthy: bool,
    pub region: Option<String>,
}

/// Probes `GET {endpoint}/health`.
///
/// Healthy when the request completes within `timeout` with a 2xx status.
/// The body is optional; a JSON body may carry the region, and one whose
/// `status` names anything other than `"ok"` marks the source unhealthy.
#[instrument(skip(client))]
pub async fn probe(client: &Client, endpoint: &str, timeout: Duration) -> ProbeOutcome {
    let url = match build_health_url(endpoint) {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot probe {endpoint}: {e}");
            return ProbeOutcome::default();
        }
    };

    let request = async {
        let response = client.get(url.clone()).timeout(timeout).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok::<_, reqwest::Error>((status, body))
    };

    match tokio::time::timeout(timeout, request).await {
        Err(_) => {
            warn!("Health probe timed out after {:?}: {}", timeout, url);
            ProbeOutcome::default()
        }
        Ok(Err(e)) => {
            warn!("Health probe failed for {}: {}", url, e);
            ProbeOutcome::default()
        }
        Ok(Ok((status, _))) if !status.is_success() => {
            warn!("Health probe returned {} for {}", status, url);
            ProbeOutcome::default()
        }
        Ok(Ok((_, body))) => {
            let report = serde_json::from_str::<HealthResponse>(&body).ok();
            let reported = report.as_ref().and_then(|r| r.status.as_deref());
            let healthy = reported.is_none_or(|status| status.eq_ignore_ascii_case("ok"));
            if !healthy {
                warn!("Health probe reported status {:?} for {}", reported, url);
            }
            debug!("Health probe for {}: healthy={}", url, healthy);
            ProbeOutcome {
                healthy,
                region: report.and_then(|r| r.region),
            }
        }
    }
}

/// Probes the configured sources and publishes snapshots
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    client: Client,
    public_endpoint: String,
    internal_endpoint: Option<String>,
    timeout: Duration,
    sender: Arc<watch::Sender<SourceHealth>>,
}

impl HealthMonitor {
    pub fn new(
        client: Client,
        public_endpoint: impl Into<String>,
        internal_endpoint: Option<String>,
        timeout: Duration,
    ) -> Self {
        let (sender, _) = watch::channel(SourceHealth::default());
        Self {
            client,
            public_endpoint: public_endpoint.into(),
            internal_endpoint,
            timeout,
            sender: Arc::new(sender),
        }
    }

    /// Latest published snapshot
    pub fn current(&self) -> SourceHealth {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SourceHealth> {
        self.sender.subscribe()
    }

    /// Probes both sources concurrently and publishes the new snapshot
    pub async fn refresh(&self) -> SourceHealth {
        let public = probe(&self.client, &self.public_endpoint, self.timeout);
        let internal = async {
            match &self.internal_endpoint {
                Some(endpoint) => probe(&self.client, endpoint, self.timeout).await,
                None => ProbeOutcome::default(),
            }
        };
        let (public, internal) = futures::join!(public, internal);

        let snapshot = SourceHealth {
            public: public.healthy,
            internal: internal.healthy,
            region: internal.region,
            checked_at: Some(Utc::now()),
        };

        let previous = self.sender.send_replace(snapshot.clone());
        if previous.public != snapshot.public || previous.internal != snapshot.internal {
            info!(
                "Source health changed: public={}, internal={}",
                snapshot.public, snapshot.internal
            );
        }
        snapshot
    }

    /// Re-probes on a fixed interval until the returned task is aborted
    pub fn spawn_refresh(&self, every: Duration) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                monitor.refresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::api::http_client::create_test_http_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn health_server(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_default_snapshot_is_unhealthy() {
        let health = SourceHealth::default();
        assert!(!health.is_healthy(SourceKind::Public));
        assert!(!health.is_healthy(SourceKind::Internal));
        assert!(!health.is_probed());
    }

    #[tokio::test]
    async fn test_probe_ok() {
        let server = health_server(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "region": "eu"})),
        )
        .await;
        let outcome = probe(&create_test_http_client(), &server.uri(), Duration::from_secs(5)).await;
        assert!(outcome.healthy);
        assert_eq!(outcome.region.as_deref(), Some("eu"));
    }

    #[tokio::test]
    async fn test_probe_unhealthy_cases() {
        let client = create_test_http_client();
        for template in [
            ResponseTemplate::new(200).set_body_json(json!({"status": "degraded"})),
            ResponseTemplate::new(503).set_body_json(json!({"status": "ok"})),
            ResponseTemplate::new(500),
        ] {
            let server = health_server(template).await;
            let outcome = probe(&client, &server.uri(), Duration::from_secs(5)).await;
            assert!(!outcome.healthy);
        }
    }

    #[tokio::test]
    async fn test_any_success_status_is_healthy() {
        let client = create_test_http_client();
        for template in [
            ResponseTemplate::new(200).set_body_string("OK"),
            ResponseTemplate::new(204),
            ResponseTemplate::new(200).set_body_json(json!({"uptime": 1234})),
        ] {
            let server = health_server(template).await;
            let outcome = probe(&client, &server.uri(), Duration::from_secs(5)).await;
            assert!(outcome.healthy);
            assert_eq!(outcome.region, None);
        }
    }

    #[tokio::test]
    async fn test_probe_timeout_is_unhealthy() {
        let server = health_server(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok"}))
                .set_delay(Duration::from_millis(500)),
        )
        .await;
        let outcome = probe(
            &create_test_http_client(),
            &server.uri(),
            Duration::from_millis(50),
        )
        .await;
        assert!(!outcome.healthy);
    }

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let server =
            health_server(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"}))).await;
        let monitor = HealthMonitor::new(
            create_test_http_client(),
            server.uri(),
            None,
            Duration::from_secs(5),
        );
        let mut receiver = monitor.subscribe();

        let snapshot = monitor.refresh().await;
        assert!(snapshot.public);
        assert!(!snapshot.internal);
        assert!(receiver.has_changed().unwrap());
        assert_eq!(*receiver.borrow_and_update(), snapshot);
        assert_eq!(monitor.current(), snapshot);
    }

    #[tokio::test]
    async fn test_spawned_refresh_updates_flags() {
        let server =
            health_server(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"}))).await;
        let monitor = HealthMonitor::new(
            create_test_http_client(),
            "http://127.0.0.1:1",
            Some(server.uri()),
            Duration::from_secs(1),
        );
        let handle = monitor.spawn_refresh(Duration::from_millis(20));
        let mut receiver = monitor.subscribe();

        tokio::time::timeout(Duration::from_secs(5), receiver.changed())
            .await
            .unwrap()
            .unwrap();
        handle.abort();

        let snapshot = monitor.current();
        assert!(snapshot.internal);
        assert!(!snapshot.public);
    }
}
