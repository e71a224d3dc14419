use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Consolidated download links for a content item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub count: u64,
    pub primary: Option<String>,
    pub mirrors: Vec<String>,
    /// Valid links grouped by hostname
    pub hosts: BTreeMap<String, Vec<String>>,
}

impl DownloadInfo {
    /// True when at least one allow-listed link survived validation
    pub fn has_links(&self) -> bool {
        self.primary.is_some()
    }

    /// Primary link followed by mirrors
    pub fn all_links(&self) -> impl Iterator<Item = &String> {
        self.primary.iter().chain(self.mirrors.iter())
    }
}

/// A track, mod or download listing in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub name: String,
    pub creator: String,
    pub description: String,
    pub category: String,
    pub thumbnail: String,
    pub images: Vec<String>,
    pub downloads: DownloadInfo,
    pub rating: f64,
    pub difficulty: String,
    pub length: String,
    pub premium: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing_utils::TestDataBuilder;

    #[test]
    fn test_download_info_default_has_no_links() {
        let info = DownloadInfo::default();
        assert!(!info.has_links());
        assert_eq!(info.all_links().count(), 0);
    }

    #[test]
    fn test_all_links_puts_primary_first() {
        let info = DownloadInfo {
            count: 3,
            primary: Some("https://www.mediafire.com/file/a".to_string()),
            mirrors: vec!["https://mega.nz/file/b".to_string()],
            hosts: BTreeMap::new(),
        };
        let links: Vec<&String> = info.all_links().collect();
        assert_eq!(links.len(), 2);
        assert!(links[0].contains("mediafire"));
    }

    #[test]
    fn test_content_item_serializes_camel_case_timestamps() {
        let item = TestDataBuilder::create_track("t1", "Club MX", "Motocross");
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
