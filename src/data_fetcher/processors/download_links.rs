//! Download link consolidation.
//!
//! Upstream records scatter download links across nested objects, arrays and
//! free text. Every string is collected, validated against the host allow
//! list and ordered by host priority so that the result depends only on the
//! set of links found.

use crate::constants::content::{ALLOWED_DOWNLOAD_HOSTS, HOST_PRIORITY, IMAGE_EXTENSIONS};
use crate::data_fetcher::models::DownloadInfo;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};
use url::Url;

/// Characters stripped from the edges of links found in free text
const TEXT_LINK_TRIM: &[char] = &['(', ')', '[', ']', '<', '>', '"', '\'', ',', '.', ';', '!'];

/// Recursively collects every string in `value` that may be a link
pub fn collect_candidate_links(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.trim().to_string()),
        Value::Array(items) => items.iter().for_each(|item| collect_candidate_links(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_candidate_links(item, out)),
        _ => {}
    }
}

/// Finds link-shaped tokens in free text such as descriptions
pub fn extract_links_from_text(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| token.trim_matches(TEXT_LINK_TRIM))
        .filter(|token| {
            token.starts_with("http://") || token.starts_with("https://") || token.starts_with("www.")
        })
        .map(str::to_string)
        .collect()
}

fn host_matches(host: &str, allowed: &str) -> bool {
    host == allowed || host.strip_suffix(allowed).is_some_and(|prefix| prefix.ends_with('.'))
}

/// Hostname used for grouping, lowercase without a leading `www.`
pub fn display_host(url: &Url) -> Option<String> {
    url.host_str()
        .map(|host| host.to_ascii_lowercase().trim_start_matches("www.").to_string())
}

/// Position of the host in the priority list; unlisted hosts sort last
pub fn host_rank(host: &str) -> usize {
    HOST_PRIORITY
        .iter()
        .position(|preferred| host_matches(host, preferred))
        .unwrap_or(HOST_PRIORITY.len())
}

/// Validates a single candidate, returning the normalized URL.
///
/// Accepts http(s) links on an allow-listed host (or one of its subdomains)
/// that do not point at an image.
pub fn validate_download_link(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let candidate = if raw.starts_with("www.") {
        format!("https://{raw}")
    } else {
        raw.to_string()
    };

    let url = Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = display_host(&url)?;
    if !ALLOWED_DOWNLOAD_HOSTS
        .iter()
        .any(|allowed| host_matches(&host, allowed))
    {
        trace!("Rejected download link on unlisted host: {host}");
        return None;
    }
    let path = url.path().to_ascii_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        trace!("Rejected image link: {candidate}");
        return None;
    }
    Some(url)
}

/// Reads the download count from the shapes upstream uses
pub fn extract_download_count(downloads: Option<&Value>) -> Option<u64> {
    match downloads? {
        Value::Object(map) => map
            .get("count")
            .or_else(|| map.get("total"))
            .and_then(super::lenient::coerce_u64),
        other => super::lenient::coerce_u64(other),
    }
}

/// Builds the canonical download structure from all link candidates.
pub fn consolidate_downloads<I, S>(candidates: I, count: u64) -> DownloadInfo
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut valid: BTreeSet<(usize, String)> = BTreeSet::new();
    let mut hosts: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for candidate in candidates {
        let Some(url) = validate_download_link(candidate.as_ref()) else {
            continue;
        };
        let Some(host) = display_host(&url) else {
            continue;
        };
        let link = url.to_string();
        if valid.insert((host_rank(&host), link.clone())) {
            hosts.entry(host).or_default().push(link);
        }
    }

    for links in hosts.values_mut() {
        links.sort();
    }

    let mut ordered = valid.into_iter().map(|(_, link)| link);
    let primary = ordered.next();
    let mirrors: Vec<String> = ordered.collect();
    debug!(
        "Consolidated downloads: primary={:?}, mirrors={}, hosts={}",
        primary,
        mirrors.len(),
        hosts.len()
    );

    DownloadInfo {
        count,
        primary,
        mirrors,
        hosts,
    }
}
