use super::{Config, RacingConfig};
use crate::error::AppError;
use std::path::Path;
use url::Url;

fn validate_endpoint(name: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::config_error(format!("{name} cannot be empty")));
    }
    let url = Url::parse(value.trim())
        .map_err(|e| AppError::config_error(format!("{name} '{value}' is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::config_error(format!(
            "{name} must use http or https, got '{}'",
            url.scheme()
        )));
    }
    Ok(())
}

fn validate_non_zero(name: &str, value: u64) -> Result<(), AppError> {
    if value == 0 {
        return Err(AppError::config_error(format!("{name} must be greater than zero")));
    }
    Ok(())
}

fn validate_racing(racing: &RacingConfig) -> Result<(), AppError> {
    if racing.port_range == 0 {
        return Err(AppError::config_error("Racing port range must be greater than zero"));
    }
    if u32::from(racing.port_base) + u32::from(racing.port_range) - 1 > u32::from(u16::MAX) {
        return Err(AppError::config_error(format!(
            "Racing ports {}..{} exceed the valid port range",
            racing.port_base,
            u32::from(racing.port_base) + u32::from(racing.port_range)
        )));
    }
    Ok(())
}

/// Validates the configuration settings
///
/// # Validation Rules
/// - Public API URL must be an http(s) URL; the internal one too when set
/// - Static fallback base, when set, cannot be blank
/// - Timeouts, retry count, rate limit and cache capacity must be non-zero
/// - Racing ports must fit in the u16 port space
/// - Log file path parent directory must exist or be creatable
pub fn validate_config(config: &Config) -> Result<(), AppError> {
    validate_endpoint("Public API URL", &config.public_api_url)?;
    if let Some(internal) = &config.internal_api_url {
        validate_endpoint("Internal API URL", internal)?;
    }
    if let Some(static_base) = &config.static_base
        && static_base.trim().is_empty()
    {
        return Err(AppError::config_error("Static fallback base cannot be empty"));
    }

    validate_non_zero("HTTP timeout", config.http_timeout_seconds)?;
    validate_non_zero("Health timeout", config.health_timeout_seconds)?;
    validate_non_zero("Health refresh interval", config.health_refresh_seconds)?;
    validate_non_zero("Load timeout", config.load_timeout_seconds)?;
    validate_non_zero("Max retries", u64::from(config.max_retries))?;
    validate_non_zero("Rate limit", u64::from(config.rate_limit_per_second))?;
    validate_non_zero("Cache capacity", config.cache_capacity as u64)?;
    validate_racing(&config.racing)?;

    if let Some(log_path) = &config.log_file_path {
        if log_path.is_empty() {
            return Err(AppError::config_error("Log file path cannot be empty"));
        }

        if let Some(parent) = Path::new(log_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config_error(format!(
                    "Cannot create log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
