pub mod fetch_utils;
pub mod http_client;
pub mod rate_limiter;
pub mod request_stats;
pub mod static_fallback;
pub mod urls;

pub use fetch_utils::{
    OutboundRequest, RequestExecutor, RetryPolicy, generate_request_id, read_json_body,
    status_error,
};
pub use http_client::create_http_client_with_timeout;
pub use rate_limiter::{RateLimitStats, RateLimiter};
pub use request_stats::{RequestStats, RequestStatsRecorder};
pub use static_fallback::StaticSource;
pub use urls::{build_content_url, build_health_url, static_data_paths};
