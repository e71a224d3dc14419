use crate::constants::{self, cache, env_vars, racing, rate_limit, retry};
use crate::data_fetcher::api::{RetryPolicy, StaticSource};
use crate::data_fetcher::models::ContentType;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub mod paths;
pub mod validation;

use paths::{get_config_path, get_log_dir_path};
use validation::validate_config;

/// Port assignment for racing requests
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RacingConfig {
    pub port_base: u16,
    pub port_range: u16,
    /// Port used when a racing request names no specific race
    pub live_port: u16,
}

impl Default for RacingConfig {
    fn default() -> Self {
        Self {
            port_base: racing::PORT_BASE,
            port_range: racing::PORT_RANGE,
            live_port: racing::LIVE_PORT,
        }
    }
}

/// Configuration structure for the application.
/// Handles loading, saving, and managing application settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Public content API. Should include the http(s) scheme.
    pub public_api_url: String,
    /// Internal API serving racing, rankings and premium content.
    /// `None` disables every type that needs it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_api_url: Option<String>,
    /// Site URL or local directory holding `static/data/*.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_base: Option<String>,
    /// Content types that may be served from static documents
    pub static_fallback_types: Vec<ContentType>,
    /// Path to the log file. If not specified, logs go to a default location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    pub http_timeout_seconds: u64,
    pub health_timeout_seconds: u64,
    pub health_refresh_seconds: u64,
    /// Hard deadline for one `load_data` call
    pub load_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub rate_limit_per_second: u32,
    pub cache_capacity: usize,
    pub fallback_cache_ttl_seconds: u64,
    pub premium_enabled: bool,
    pub racing: RacingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            public_api_url: constants::DEFAULT_PUBLIC_API_URL.to_string(),
            internal_api_url: Some(constants::DEFAULT_INTERNAL_API_URL.to_string()),
            static_base: Some(constants::DEFAULT_STATIC_BASE.to_string()),
            static_fallback_types: vec![
                ContentType::Tracks,
                ContentType::Mods,
                ContentType::Downloads,
                ContentType::Rankings,
            ],
            log_file_path: None,
            http_timeout_seconds: constants::DEFAULT_HTTP_TIMEOUT_SECONDS,
            health_timeout_seconds: constants::DEFAULT_HEALTH_TIMEOUT_SECONDS,
            health_refresh_seconds: constants::DEFAULT_HEALTH_REFRESH_SECONDS,
            load_timeout_seconds: constants::DEFAULT_LOAD_TIMEOUT_SECONDS,
            max_retries: retry::MAX_ATTEMPTS,
            retry_base_delay_ms: retry::BASE_DELAY_MS,
            rate_limit_per_second: rate_limit::DEFAULT_PER_SECOND,
            cache_capacity: cache::DEFAULT_CAPACITY,
            fallback_cache_ttl_seconds: cache::FALLBACK_TTL_SECONDS,
            premium_enabled: false,
            racing: RacingConfig::default(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_string(name)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring non-numeric {name}={raw}");
            None
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location, falling
    /// back to defaults when no file exists.
    ///
    /// # Environment Variables
    /// - `MXB_PUBLIC_API_URL` - Override the public API URL
    /// - `MXB_INTERNAL_API_URL` - Override the internal API URL
    /// - `MXB_STATIC_BASE` - Override the static fallback base
    /// - `MXB_LOG_FILE` - Override log file path
    /// - `MXB_HTTP_TIMEOUT` - Override HTTP timeout in seconds
    /// - `MXB_RATE_LIMIT` - Override requests allowed per second
    ///
    /// Environment variables take precedence over the config file.
    pub async fn load() -> Result<Self, AppError> {
        let config_path = get_config_path();

        let mut config = if Path::new(&config_path).exists() {
            debug!("Loading config from {config_path}");
            Self::load_from_path(&config_path).await?
        } else {
            debug!("No config file at {config_path}, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Overrides fields from `MXB_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = env_string(env_vars::PUBLIC_API_URL) {
            self.public_api_url = url;
        }
        if let Some(url) = env_string(env_vars::INTERNAL_API_URL) {
            self.internal_api_url = Some(url);
        }
        if let Some(base) = env_string(env_vars::STATIC_BASE) {
            self.static_base = Some(base);
        }
        if let Some(log_file_path) = env_string(env_vars::LOG_FILE) {
            self.log_file_path = Some(log_file_path);
        }
        if let Some(timeout) = env_number::<u64>(env_vars::HTTP_TIMEOUT) {
            self.http_timeout_seconds = timeout;
        }
        if let Some(limit) = env_number::<u32>(env_vars::RATE_LIMIT) {
            self.rate_limit_per_second = limit;
        }
    }

    /// Validates the configuration settings
    pub fn validate(&self) -> Result<(), AppError> {
        validate_config(self)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            ..RetryPolicy::default()
        }
    }

    /// Parsed static fallback location, if one is configured
    pub fn static_source(&self) -> Result<Option<StaticSource>, AppError> {
        self.static_base
            .as_deref()
            .map(StaticSource::parse)
            .transpose()
    }

    pub fn has_static_fallback(&self, content_type: ContentType) -> bool {
        self.static_base.is_some() && self.static_fallback_types.contains(&content_type)
    }

    /// Saves current configuration to the default config file location.
    pub async fn save(&self) -> Result<(), AppError> {
        let config_path = get_config_path();
        self.save_to_path(&config_path).await
    }

    /// Returns the platform-specific path for the config file.
    pub fn get_config_path() -> String {
        paths::get_config_path()
    }

    /// Returns the platform-specific path for the log directory.
    pub fn get_log_dir_path() -> String {
        paths::get_log_dir_path()
    }

    /// Displays current configuration settings to stdout.
    pub async fn display() -> Result<(), AppError> {
        let config_path = get_config_path();
        let log_dir = get_log_dir_path();
        let config = Config::load().await?;

        println!("\nCurrent Configuration");
        println!("────────────────────────────────────");
        println!("Config Location:");
        if Path::new(&config_path).exists() {
            println!("{config_path}");
        } else {
            println!("{config_path} (not created, using defaults)");
        }
        println!("────────────────────────────────────");
        println!("Public API:");
        println!("{}", config.public_api_url);
        println!("Internal API:");
        println!("{}", config.internal_api_url.as_deref().unwrap_or("(disabled)"));
        println!("Static Fallback:");
        println!("{}", config.static_base.as_deref().unwrap_or("(disabled)"));
        println!("────────────────────────────────────");
        println!("HTTP Timeout: {} seconds", config.http_timeout_seconds);
        println!("Load Timeout: {} seconds", config.load_timeout_seconds);
        println!("Rate Limit: {} requests/second", config.rate_limit_per_second);
        println!("Cache Capacity: {} entries", config.cache_capacity);
        println!("Premium Access: {}", config.premium_enabled);
        println!("────────────────────────────────────");
        println!("Log File Location:");
        if let Some(custom_path) = &config.log_file_path {
            println!("{custom_path}");
        } else {
            println!("{log_dir}/mxbikes_data.log");
            println!("(Default location)");
        }

        Ok(())
    }

    /// Saves configuration to a custom file path, creating the parent
    /// directory if needed.
    ///
    /// # Errors
    /// * `AppError::Config` - If the provided path has no parent directory
    /// * `AppError::Io` - If there's an I/O error creating directories or writing the file
    /// * `AppError::TomlSerialize` - If there's an error serializing the configuration
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }
        let content = toml::to_string_pretty(self)?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Loads configuration from a custom file path. Missing fields take
    /// their defaults.
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    fn clear_env() {
        unsafe {
            for name in [
                env_vars::PUBLIC_API_URL,
                env_vars::INTERNAL_API_URL,
                env_vars::STATIC_BASE,
                env_vars::LOG_FILE,
                env_vars::HTTP_TIMEOUT,
                env_vars::RATE_LIMIT,
            ] {
                std::env::remove_var(name);
            }
        }
    }

    #[tokio::test]
    async fn test_config_load_partial_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let config_path_str = config_path.to_string_lossy();

        let config_content = r#"
public_api_url = "https://api.example.com"
premium_enabled = true

[racing]
port_base = 60000
"#;
        tokio::fs::write(&config_path, config_content).await.unwrap();

        let config = Config::load_from_path(&config_path_str).await.unwrap();

        assert_eq!(config.public_api_url, "https://api.example.com");
        assert!(config.premium_enabled);
        assert_eq!(config.racing.port_base, 60000);
        assert_eq!(config.racing.port_range, racing::PORT_RANGE);
        assert_eq!(config.cache_capacity, 200);
        assert_eq!(config.http_timeout_seconds, 15);
        assert_eq!(
            config.internal_api_url.as_deref(),
            Some(constants::DEFAULT_INTERNAL_API_URL)
        );
    }

    #[tokio::test]
    async fn test_config_load_static_fallback_types() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            "static_fallback_types = [\"races\", \"mods\"]\n",
        )
        .await
        .unwrap();

        let config = Config::load_from_path(&config_path.to_string_lossy())
            .await
            .unwrap();
        assert_eq!(
            config.static_fallback_types,
            vec![ContentType::Races, ContentType::Mods]
        );
        assert!(config.has_static_fallback(ContentType::Races));
        assert!(!config.has_static_fallback(ContentType::Tracks));
    }

    #[tokio::test]
    async fn test_config_load_invalid_toml() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        tokio::fs::write(&config_path, "cache_capacity = \"lots\"").await.unwrap();

        let err = Config::load_from_path(&config_path.to_string_lossy())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TomlDeserialize(_)));
    }

    #[tokio::test]
    async fn test_config_save_and_load_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");
        let config_path_str = config_path.to_string_lossy();
        let original_config = Config {
            public_api_url: "https://api.example.com".to_string(),
            internal_api_url: None,
            log_file_path: Some("/custom/log/path".to_string()),
            premium_enabled: true,
            ..Config::default()
        };
        original_config.save_to_path(&config_path_str).await.unwrap();
        assert!(config_path.exists());

        let content = tokio::fs::read_to_string(&config_path).await.unwrap();
        assert!(
            content.contains("public_api_url") && content.contains("https://api.example.com"),
            "Content should contain public_api_url. Content: {content}"
        );
        assert!(!content.contains("internal_api_url"));

        let loaded_config = Config::load_from_path(&config_path_str).await.unwrap();
        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = Config {
            max_retries: 5,
            retry_base_delay_ms: 10,
            ..Config::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_static_source() {
        let config = Config::default();
        assert!(matches!(
            config.static_source().unwrap(),
            Some(StaticSource::Http(_))
        ));

        let config = Config {
            static_base: None,
            ..Config::default()
        };
        assert!(config.static_source().unwrap().is_none());
        assert!(!config.has_static_fallback(ContentType::Tracks));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        unsafe {
            std::env::set_var(env_vars::PUBLIC_API_URL, "http://localhost:9000");
            std::env::set_var(env_vars::HTTP_TIMEOUT, "42");
            std::env::set_var(env_vars::RATE_LIMIT, "not-a-number");
            std::env::set_var(env_vars::STATIC_BASE, "/srv/site");
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        clear_env();

        assert_eq!(config.public_api_url, "http://localhost:9000");
        assert_eq!(config.http_timeout_seconds, 42);
        assert_eq!(config.rate_limit_per_second, rate_limit::DEFAULT_PER_SECOND);
        assert_eq!(config.static_base.as_deref(), Some("/srv/site"));
    }

    #[test]
    #[serial]
    fn test_blank_env_values_are_ignored() {
        clear_env();
        unsafe {
            std::env::set_var(env_vars::LOG_FILE, "   ");
        }
        let mut config = Config::default();
        config.apply_env_overrides();
        clear_env();
        assert!(config.log_file_path.is_none());
    }

    #[test]
    fn test_get_config_path() {
        let config_path = Config::get_config_path();
        assert!(config_path.contains("mxbikes_data"));
        assert!(config_path.ends_with("config.toml"));
    }

    #[test]
    fn test_get_log_dir_path() {
        let log_dir_path = Config::get_log_dir_path();
        assert!(log_dir_path.contains("mxbikes_data"));
        assert!(log_dir_path.ends_with("logs"));
    }
}
