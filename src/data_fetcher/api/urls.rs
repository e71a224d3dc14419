//! URL building utilities for upstream endpoints

use url::Url;

use crate::data_fetcher::models::{ContentType, LoadOptions};
use crate::error::AppError;

fn parse_endpoint(endpoint: &str) -> Result<Url, AppError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    Url::parse(trimmed)
        .map_err(|e| AppError::validation(format!("Invalid endpoint URL '{endpoint}': {e}")))
}

/// Builds the listing URL for a content type with canonical query parameters.
///
/// # Example
/// ```
/// use mxbikes_data::data_fetcher::api::build_content_url;
/// use mxbikes_data::data_fetcher::models::{ContentType, LoadOptions};
///
/// let options = LoadOptions::new().with_search("club mx").with_page(2);
/// let url = build_content_url("https://api.example.com/", ContentType::Tracks, &options).unwrap();
/// assert_eq!(url.as_str(), "https://api.example.com/tracks?page=2&search=club+mx");
/// ```
pub fn build_content_url(
    endpoint: &str,
    content_type: ContentType,
    options: &LoadOptions,
) -> Result<Url, AppError> {
    let mut url = parse_endpoint(endpoint)?;
    url.path_segments_mut()
        .map_err(|_| AppError::validation(format!("Endpoint '{endpoint}' cannot be a base URL")))?
        .pop_if_empty()
        .push(content_type.as_str());

    let pairs = options.query_pairs();
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
}

/// Builds the health probe URL for an endpoint
pub fn build_health_url(endpoint: &str) -> Result<Url, AppError> {
    let mut url = parse_endpoint(endpoint)?;
    url.path_segments_mut()
        .map_err(|_| AppError::validation(format!("Endpoint '{endpoint}' cannot be a base URL")))?
        .pop_if_empty()
        .push("health");
    Ok(url)
}

/// Relative paths of the static fallback documents, in the order they are
/// tried. The site publishes the leaderboard as `ranked-fallback.json`.
pub fn static_data_paths(content_type: ContentType) -> Vec<String> {
    let name = content_type.as_str();
    let mut paths = vec![
        format!("static/data/{name}.json"),
        format!("static/data/{name}-fallback.json"),
    ];
    if content_type == ContentType::Rankings {
        paths.push("static/data/ranked-fallback.json".to_string());
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::models::SortOrder;

    #[test]
    fn test_build_content_url_without_options() {
        let url = build_content_url("https://api.mxbikes.app", ContentType::Mods, &LoadOptions::new())
            .unwrap();
        assert_eq!(url.as_str(), "https://api.mxbikes.app/mods");
    }

    #[test]
    fn test_build_content_url_keeps_endpoint_path() {
        let options = LoadOptions::new()
            .with_category("Supercross")
            .with_sort(SortOrder::Newest)
            .with_premium(true);
        let url = build_content_url("http://127.0.0.1:8080/api/", ContentType::Tracks, &options)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/tracks?category=Supercross&premium=true&sort=newest"
        );
    }

    #[test]
    fn test_build_content_url_encodes_values() {
        let options = LoadOptions::new().with_search("a&b=c");
        let url = build_content_url("https://api.mxbikes.app", ContentType::Tracks, &options).unwrap();
        assert_eq!(url.query(), Some("search=a%26b%3Dc"));
    }

    #[test]
    fn test_build_health_url() {
        assert_eq!(
            build_health_url("https://api.mxbikes.xyz/").unwrap().as_str(),
            "https://api.mxbikes.xyz/health"
        );
    }

    #[test]
    fn test_invalid_endpoint_is_validation_error() {
        let err = build_health_url("not a url").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_static_data_paths() {
        assert_eq!(
            static_data_paths(ContentType::Races),
            [
                "static/data/races.json".to_string(),
                "static/data/races-fallback.json".to_string()
            ]
        );
        assert_eq!(
            static_data_paths(ContentType::Rankings).last().map(String::as_str),
            Some("static/data/ranked-fallback.json")
        );
    }
}
