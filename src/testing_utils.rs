use crate::data_fetcher::models::{
    ContentItem, DownloadInfo, RaceEvent, RaceStatus, RankingEntry, RiderProfile,
};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Test utilities for creating mock data and upstream payloads
pub struct TestDataBuilder;

impl TestDataBuilder {
    /// Creates a normalized track listing
    pub fn create_track(id: &str, name: &str, category: &str) -> ContentItem {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 18, 30, 0).single();
        ContentItem {
            id: id.to_string(),
            name: name.to_string(),
            creator: "Test Creator".to_string(),
            description: format!("{name} test track"),
            category: category.to_string(),
            thumbnail: "/static/assets/images/placeholder.jpg".to_string(),
            images: vec![],
            downloads: DownloadInfo::default(),
            rating: 4.0,
            difficulty: "Medium".to_string(),
            length: "Unknown".to_string(),
            premium: false,
            version: None,
            created_at: created,
            updated_at: created,
        }
    }

    /// Creates a track with a single primary download link
    pub fn create_track_with_download(id: &str, name: &str, url: &str) -> ContentItem {
        let mut item = Self::create_track(id, name, "Motocross");
        let mut hosts = BTreeMap::new();
        if let Ok(parsed) = url::Url::parse(url)
            && let Some(host) = parsed.host_str()
        {
            hosts.insert(host.trim_start_matches("www.").to_string(), vec![url.to_string()]);
        }
        item.downloads = DownloadInfo {
            count: 10,
            primary: Some(url.to_string()),
            mirrors: vec![],
            hosts,
        };
        item
    }

    /// Creates a race event
    pub fn create_race(id: &str, status: RaceStatus, max_riders: u32, current_riders: u32) -> RaceEvent {
        RaceEvent {
            id: id.to_string(),
            name: format!("Race {id}"),
            status,
            track_id: Some("track-1".to_string()),
            format: "Standard".to_string(),
            max_riders,
            current_riders,
            start_time: Utc.with_ymd_and_hms(2024, 1, 15, 19, 0, 0).single(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 18, 0, 0).single(),
            updated_at: None,
        }
    }

    /// Creates a leaderboard entry
    pub fn create_ranking(rank: u32, rider_name: &str, elo: i32) -> RankingEntry {
        RankingEntry {
            rank,
            rider_name: rider_name.to_string(),
            elo,
            races_completed: 12,
            last_race_at: None,
        }
    }

    /// Creates a rider profile
    pub fn create_rider(id: &str, name: &str, elo: i32) -> RiderProfile {
        RiderProfile {
            id: id.to_string(),
            name: name.to_string(),
            elo,
            races_completed: 5,
            last_race_at: None,
            is_race_manager: false,
            linked_accounts: BTreeMap::new(),
        }
    }

    /// Raw upstream track record with the field spellings the public API uses
    pub fn raw_track(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "title": name,
            "creator": "Test Creator",
            "description": "A raw track record",
            "category": "motocross",
            "thumbnail": "https://cdn.mxbikes.app/tracks/thumb.jpg",
            "downloads": {
                "count": 42,
                "links": [
                    "https://mega.nz/file/abc",
                    "https://www.mediafire.com/file/xyz/track.zip"
                ]
            },
            "rating": 4.5,
            "created_at": "2024-01-15 18:30:00"
        })
    }

    /// Raw upstream race record
    pub fn raw_race(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "name": format!("Race {id}"),
            "status": status,
            "track_id": "track-1",
            "max_riders": 20,
            "current_riders": 8,
            "start_time": "2024-01-15T19:00:00Z"
        })
    }

    /// Raw upstream leaderboard entry
    pub fn raw_ranking(rank: u32, name: &str, elo: i32) -> Value {
        json!({
            "rank": rank,
            "rider_name": name,
            "elo_rating": elo,
            "races_completed": 3
        })
    }

    /// Upstream health response
    pub fn health_ok() -> Value {
        json!({"status": "ok"})
    }
}
