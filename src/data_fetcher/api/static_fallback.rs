//! Static JSON documents used when a live source is down

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

use super::fetch_utils::{OutboundRequest, RequestExecutor};
use super::urls::static_data_paths;
use crate::data_fetcher::models::ContentType;
use crate::error::AppError;

/// Where static fallback documents live: a site serving
/// `/static/data/*.json` or a local directory with the same layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticSource {
    Http(Url),
    Directory(PathBuf),
}

impl StaticSource {
    /// Parses a configured base. http(s) values are URLs, anything else is a
    /// directory path.
    pub fn parse(base: &str) -> Result<Self, AppError> {
        let base = base.trim();
        if base.is_empty() {
            return Err(AppError::validation("Static fallback base must not be empty"));
        }
        if base.starts_with("http://") || base.starts_with("https://") {
            let with_slash = format!("{}/", base.trim_end_matches('/'));
            Url::parse(&with_slash)
                .map(StaticSource::Http)
                .map_err(|e| AppError::validation(format!("Invalid static base URL '{base}': {e}")))
        } else {
            Ok(StaticSource::Directory(PathBuf::from(base)))
        }
    }

    /// Loads the first available document for a content type.
    ///
    /// Tries `{type}.json` then `{type}-fallback.json`; the last error is
    /// returned when none loads.
    pub async fn load(
        &self,
        content_type: ContentType,
        executor: &RequestExecutor,
    ) -> Result<Value, AppError> {
        let mut last_error = AppError::data_unavailable(content_type.as_str());

        for relative in static_data_paths(content_type) {
            let attempt = match self {
                StaticSource::Http(base) => match base.join(&relative) {
                    Ok(url) => executor.fetch_json(&OutboundRequest::new(url)).await,
                    Err(e) => Err(AppError::validation(format!(
                        "Invalid static path '{relative}': {e}"
                    ))),
                },
                StaticSource::Directory(dir) => read_json_file(dir.join(&relative)).await,
            };

            match attempt {
                Ok(value) => {
                    info!("Loaded static fallback for {content_type} from {relative}");
                    return Ok(value);
                }
                Err(e) => {
                    debug!("Static fallback {relative} unavailable: {e}");
                    last_error = e;
                }
            }
        }

        warn!("No static fallback could be loaded for {content_type}");
        Err(last_error)
    }
}

impl fmt::Display for StaticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticSource::Http(url) => write!(f, "{url}"),
            StaticSource::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

async fn read_json_file(path: PathBuf) -> Result<Value, AppError> {
    let text = tokio::fs::read_to_string(&path).await?;
    Ok(serde_json::from_str(&text)?)
}
