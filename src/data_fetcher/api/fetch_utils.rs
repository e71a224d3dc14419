//! Outbound request execution with rate limiting, retry and error mapping

use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::rate_limiter::RateLimiter;
use super::request_stats::RequestStatsRecorder;
use crate::constants::{CLIENT_VERSION, headers, retry};
use crate::error::AppError;

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates a unique request id: millisecond timestamp, process-wide
/// sequence number and a random suffix
pub fn generate_request_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let sequence = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let suffix: u32 = rand::random();
    format!("{millis}-{sequence}-{suffix:08x}")
}

/// Retry bounds for one logical request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed for network-level failures
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Consecutive 429 responses tolerated before giving up
    pub max_rate_limited_retries: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: retry::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry::BASE_DELAY_MS),
            max_rate_limited_retries: retry::MAX_RATE_LIMITED_RETRIES,
            max_delay: Duration::from_secs(retry::MAX_DELAY_SECONDS),
        }
    }
}

impl RetryPolicy {
    /// `base * 2^attempt`, capped at `max_delay`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// A single outbound GET
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: Url,
    pub racing_port: Option<u16>,
}

impl OutboundRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            racing_port: None,
        }
    }

    pub fn with_racing_port(mut self, port: Option<u16>) -> Self {
        self.racing_port = port;
        self
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Maps a transport error onto the network error variants
pub fn map_transport_error(url: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::network_timeout(url)
    } else if e.is_connect() || e.is_request() {
        AppError::network_connection(url, e.to_string())
    } else {
        AppError::ApiFetch(e)
    }
}

/// Maps a non-success HTTP status onto the API error variants
pub fn status_error(status: StatusCode, url: &str) -> AppError {
    let status_code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("Unknown error");
    match status_code {
        404 => AppError::api_not_found(url),
        429 => AppError::api_rate_limit(reason, url),
        502 | 503 => AppError::api_service_unavailable(status_code, reason, url),
        400..=499 => AppError::api_client_error(status_code, reason, url),
        _ => AppError::api_server_error(status_code, reason, url),
    }
}

/// Reads a response body as JSON, distinguishing empty and non-JSON bodies
pub async fn read_json_body(response: Response, url: &str) -> Result<Value, AppError> {
    let response_text = response.text().await.map_err(|e| {
        error!("Failed to read response text from URL {}: {}", url, e);
        map_transport_error(url, e)
    })?;
    debug!("Response length: {} bytes", response_text.len());

    if response_text.trim().is_empty() {
        return Err(AppError::api_malformed_json("Response body is empty", url));
    }
    serde_json::from_str::<Value>(&response_text).map_err(|e| {
        error!("Failed to parse API response: {} (URL: {})", e, url);
        error!(
            "Response text (first 200 chars): {}",
            &response_text.chars().take(200).collect::<String>()
        );
        AppError::api_malformed_json(e.to_string(), url)
    })
}

/// Issues outbound requests through the shared limiter and stats recorder
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    limiter: RateLimiter,
    stats: RequestStatsRecorder,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(
        client: Client,
        limiter: RateLimiter,
        stats: RequestStatsRecorder,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            limiter,
            stats,
            policy,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn stats(&self) -> &RequestStatsRecorder {
        &self.stats
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends the request, retrying network failures and 429 responses.
    ///
    /// Returns the first response whose status is not 429; callers decide
    /// what other statuses mean. A local limiter rejection fails at once
    /// without touching the network.
    #[instrument(skip(self), fields(url = %request.url))]
    pub async fn execute(&self, request: &OutboundRequest) -> Result<Response, AppError> {
        let url = request.url.as_str();
        let mut attempt = 0u32;
        let mut rate_limited = 0u32;

        loop {
            if let Err(e) = self.limiter.acquire().await {
                self.stats.record_rate_limited();
                return Err(e);
            }

            self.stats.record_attempt();
            let request_id = generate_request_id();
            let mut builder = self
                .client
                .get(request.url.clone())
                .header(headers::CLIENT_VERSION, CLIENT_VERSION)
                .header(headers::REQUEST_ID, &request_id);
            if let Some(port) = request.racing_port {
                builder = builder.header(headers::RACING_PORT, port.to_string());
            }
            debug!("Sending request {request_id} to {url}");

            match builder.send().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    rate_limited += 1;
                    if rate_limited > self.policy.max_rate_limited_retries {
                        let err = AppError::api_rate_limit(
                            format!("Still rate limited after {} retries", rate_limited - 1),
                            url,
                        );
                        error!("Giving up on {url}: {err}");
                        self.stats.record_failure(&err);
                        return Err(err);
                    }
                    let wait = retry_after(&response)
                        .unwrap_or_else(|| self.policy.backoff(rate_limited - 1))
                        .min(self.policy.max_delay);
                    warn!(
                        "Rate limited by {}. Retrying in {:?} (rate limited {}/{})",
                        url, wait, rate_limited, self.policy.max_rate_limited_retries
                    );
                    tokio::time::sleep(wait).await;
                }
                Ok(response) => {
                    debug!("Response status: {} for {}", response.status(), url);
                    return Ok(response);
                }
                Err(e) => {
                    let err = map_transport_error(url, e);
                    attempt += 1;
                    let transient = matches!(
                        err,
                        AppError::NetworkTimeout { .. } | AppError::NetworkConnection { .. }
                    );
                    if !transient || attempt >= self.policy.max_retries {
                        error!("Request failed for URL {} after {} attempts: {}", url, attempt, err);
                        self.stats.record_failure(&err);
                        return Err(err);
                    }
                    let wait = self.policy.backoff(attempt - 1);
                    warn!(
                        "Request error {} for {}. Retrying in {:?} (attempt {}/{})",
                        err, url, wait, attempt, self.policy.max_retries
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Executes the request and parses a successful JSON body
    pub async fn fetch_json(&self, request: &OutboundRequest) -> Result<Value, AppError> {
        info!("Fetching data from URL: {}", request.url);
        let response = self.execute(request).await?;
        let url = request.url.as_str();
        let status = response.status();

        if !status.is_success() {
            let err = status_error(status, url);
            error!("HTTP {} (URL: {})", status.as_u16(), url);
            self.stats.record_failure(&err);
            return Err(err);
        }

        match read_json_body(response, url).await {
            Ok(value) => {
                self.stats.record_success();
                Ok(value)
            }
            Err(err) => {
                self.stats.record_failure(&err);
                Err(err)
            }
        }
    }
}
