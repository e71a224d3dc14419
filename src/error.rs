use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to fetch data from API: {0}")]
    ApiFetch(#[from] reqwest::Error),

    #[error("Failed to parse API response: {0}")]
    ApiParse(#[from] serde_json::Error),

    // Specific HTTP status code errors
    #[error("API request not found (404): {url}")]
    ApiNotFound { url: String },

    #[error("API server error ({status}): {message} (URL: {url})")]
    ApiServerError {
        status: u16,
        message: String,
        url: String,
    },

    #[error("API client error ({status}): {message} (URL: {url})")]
    ApiClientError {
        status: u16,
        message: String,
        url: String,
    },

    #[error("API rate limit exceeded (429): {message} (URL: {url})")]
    ApiRateLimit { message: String, url: String },

    #[error("API service unavailable ({status}): {message} (URL: {url})")]
    ApiServiceUnavailable {
        status: u16,
        message: String,
        url: String,
    },

    // Network-specific errors
    #[error("Network timeout while fetching data from: {url}")]
    NetworkTimeout { url: String },

    #[error("Connection failed to: {url} - {message}")]
    NetworkConnection { url: String, message: String },

    // Data parsing and validation errors
    #[error("API returned malformed JSON: {message} (URL: {url})")]
    ApiMalformedJson { message: String, url: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    // Source selection and rate limiting
    #[error("Local rate limit exceeded: {limit} requests per {window_ms}ms")]
    RateLimitExceeded { limit: u32, window_ms: u64 },

    #[error("{source_name} API is not available: {reason}")]
    ApiUnavailable { source_name: String, reason: String },

    #[error("Unable to load {content_type} right now. Please try again later.")]
    DataUnavailable { content_type: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Log setup error: {0}")]
    LogSetup(String),
}

/// Coarse error classification tracked in request statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Network,
    Api,
    Parse,
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Network => "NETWORK",
            ErrorKind::Api => "API",
            ErrorKind::Parse => "PARSE",
            ErrorKind::Validation => "VALIDATION",
        };
        f.write_str(label)
    }
}

impl AppError {
    /// Create a configuration error with context
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a log setup error with context
    pub fn log_setup_error(msg: impl Into<String>) -> Self {
        Self::LogSetup(msg.into())
    }

    /// Create a validation error for bad input types or shapes
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an API not found error
    pub fn api_not_found(url: impl Into<String>) -> Self {
        Self::ApiNotFound { url: url.into() }
    }

    /// Create an API server error (5xx status codes)
    pub fn api_server_error(
        status: u16,
        message: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::ApiServerError {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an API client error (4xx status codes except 404 and 429)
    pub fn api_client_error(
        status: u16,
        message: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::ApiClientError {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an API rate limit error
    pub fn api_rate_limit(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiRateLimit {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an API service unavailable error
    pub fn api_service_unavailable(
        status: u16,
        message: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::ApiServiceUnavailable {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create a network timeout error
    pub fn network_timeout(url: impl Into<String>) -> Self {
        Self::NetworkTimeout { url: url.into() }
    }

    /// Create a network connection error
    pub fn network_connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NetworkConnection {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a malformed JSON error
    pub fn api_malformed_json(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiMalformedJson {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create a local rate limiter rejection
    pub fn rate_limit_exceeded(limit: u32, window_ms: u64) -> Self {
        Self::RateLimitExceeded { limit, window_ms }
    }

    /// Create an error for a source whose health flag is down
    pub fn api_unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ApiUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create the terminal user-facing error for a content type
    pub fn data_unavailable(content_type: impl Into<String>) -> Self {
        Self::DataUnavailable {
            content_type: content_type.into(),
        }
    }

    /// Copies the error for callers sharing one load. Wrapped library errors
    /// keep their message under the closest owned variant.
    pub fn replicate(&self) -> Self {
        match self {
            AppError::ApiFetch(e) => AppError::NetworkConnection {
                url: e.url().map(|url| url.to_string()).unwrap_or_default(),
                message: e.to_string(),
            },
            AppError::ApiParse(e) => AppError::api_malformed_json(e.to_string(), ""),
            AppError::ApiNotFound { url } => AppError::api_not_found(url.clone()),
            AppError::ApiServerError {
                status,
                message,
                url,
            } => AppError::api_server_error(*status, message.clone(), url.clone()),
            AppError::ApiClientError {
                status,
                message,
                url,
            } => AppError::api_client_error(*status, message.clone(), url.clone()),
            AppError::ApiRateLimit { message, url } => {
                AppError::api_rate_limit(message.clone(), url.clone())
            }
            AppError::ApiServiceUnavailable {
                status,
                message,
                url,
            } => AppError::api_service_unavailable(*status, message.clone(), url.clone()),
            AppError::NetworkTimeout { url } => AppError::network_timeout(url.clone()),
            AppError::NetworkConnection { url, message } => {
                AppError::network_connection(url.clone(), message.clone())
            }
            AppError::ApiMalformedJson { message, url } => {
                AppError::api_malformed_json(message.clone(), url.clone())
            }
            AppError::Validation(msg) => AppError::Validation(msg.clone()),
            AppError::RateLimitExceeded { limit, window_ms } => {
                AppError::rate_limit_exceeded(*limit, *window_ms)
            }
            AppError::ApiUnavailable {
                source_name,
                reason,
            } => AppError::api_unavailable(source_name.clone(), reason.clone()),
            AppError::DataUnavailable { content_type } => {
                AppError::data_unavailable(content_type.clone())
            }
            AppError::Io(e) => AppError::Io(std::io::Error::new(e.kind(), e.to_string())),
            AppError::TomlSerialize(e) => AppError::Config(e.to_string()),
            AppError::TomlDeserialize(e) => AppError::Config(e.to_string()),
            AppError::Config(msg) => AppError::Config(msg.clone()),
            AppError::LogSetup(msg) => AppError::LogSetup(msg.clone()),
        }
    }

    /// Classify the error for request statistics
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ApiFetch(_)
            | AppError::NetworkTimeout { .. }
            | AppError::NetworkConnection { .. }
            | AppError::RateLimitExceeded { .. }
            | AppError::Io(_) => ErrorKind::Network,
            AppError::ApiParse(_)
            | AppError::ApiMalformedJson { .. }
            | AppError::TomlDeserialize(_) => ErrorKind::Parse,
            AppError::Validation(_) | AppError::Config(_) => ErrorKind::Validation,
            AppError::ApiNotFound { .. }
            | AppError::ApiServerError { .. }
            | AppError::ApiClientError { .. }
            | AppError::ApiRateLimit { .. }
            | AppError::ApiServiceUnavailable { .. }
            | AppError::ApiUnavailable { .. }
            | AppError::DataUnavailable { .. }
            | AppError::TomlSerialize(_)
            | AppError::LogSetup(_) => ErrorKind::Api,
        }
    }

    /// Check if error is retryable (network issues, server errors, rate limits)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkTimeout { .. }
                | AppError::NetworkConnection { .. }
                | AppError::ApiServerError { .. }
                | AppError::ApiServiceUnavailable { .. }
                | AppError::ApiRateLimit { .. }
        )
    }

    /// Errors that go to the caller unchanged instead of being folded into
    /// `DataUnavailable`
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::DataUnavailable { .. }
                | AppError::RateLimitExceeded { .. }
        )
    }

    /// Message suitable for display next to a retry affordance
    pub fn user_message(&self) -> String {
        match self {
            AppError::DataUnavailable { .. } | AppError::Validation(_) => self.to_string(),
            AppError::RateLimitExceeded { .. } => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            _ => "Something went wrong while loading data. Please try again.".to_string(),
        }
    }
}
