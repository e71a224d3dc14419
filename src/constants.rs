//! Application-wide constants and configuration values
//!
//! This module centralizes the magic numbers, default values and header names
//! used across the data-access layer.

#![allow(dead_code)]

/// Client version sent upstream in the `X-Client-Version` header
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for regular HTTP requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 15;

/// Default timeout for health probes in seconds
pub const DEFAULT_HEALTH_TIMEOUT_SECONDS: u64 = 5;

/// Interval between background health probes in seconds
pub const DEFAULT_HEALTH_REFRESH_SECONDS: u64 = 30;

/// Hard deadline for a single `load_data` call in seconds
pub const DEFAULT_LOAD_TIMEOUT_SECONDS: u64 = 15;

/// Maximum number of connections per host in the HTTP client pool
pub const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Default production API for public content
pub const DEFAULT_PUBLIC_API_URL: &str = "https://api.mxbikes.app";

/// Default internal API for racing, rider and ranking data
pub const DEFAULT_INTERNAL_API_URL: &str = "https://api.mxbikes.xyz";

/// Default base for static fallback payloads
pub const DEFAULT_STATIC_BASE: &str = "https://mxbikes.net";

/// Outbound header names
pub mod headers {
    pub const CLIENT_VERSION: &str = "X-Client-Version";
    pub const REQUEST_ID: &str = "X-Request-ID";
    pub const RACING_PORT: &str = "X-Racing-Port";
}

/// Cache sizing and TTL values
pub mod cache {
    /// Default LRU capacity of the response cache
    pub const DEFAULT_CAPACITY: usize = 200;

    /// TTL for entries seeded from a static fallback (5 minutes), so the
    /// live source is retried once it recovers
    pub const FALLBACK_TTL_SECONDS: u64 = 300;
}

/// Retry configuration
pub mod retry {
    /// Maximum number of retry attempts for network failures
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 1000;

    /// Upper bound for consecutive 429 responses, which do not consume
    /// regular attempts
    pub const MAX_RATE_LIMITED_RETRIES: u32 = 5;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECONDS: u64 = 30;
}

/// Local rate limiter defaults
pub mod rate_limit {
    /// Requests allowed per window
    pub const DEFAULT_PER_SECOND: u32 = 10;

    /// Sliding window length in milliseconds
    pub const WINDOW_MS: u64 = 1000;
}

/// Racing port selection for the `X-Racing-Port` header
pub mod racing {
    pub const PORT_BASE: u16 = 54210;
    pub const PORT_RANGE: u16 = 10;
    pub const LIVE_PORT: u16 = 54200;
}

/// Defaults table for fields missing from upstream payloads
pub mod defaults {
    pub const TRACK_NAME: &str = "Unnamed Track";
    pub const MOD_NAME: &str = "Unnamed Mod";
    pub const CREATOR: &str = "Unknown";
    pub const DESCRIPTION: &str = "";
    pub const CATEGORY: &str = "Uncategorized";
    pub const THUMBNAIL: &str = "/static/assets/images/placeholder.jpg";
    pub const RATING: f64 = 0.0;
    pub const DIFFICULTY: &str = "Medium";
    pub const LENGTH: &str = "Unknown";
    pub const RACE_NAME: &str = "Untitled Race";
    pub const RACE_FORMAT: &str = "Standard";
    pub const RACE_MAX_RIDERS: u32 = 40;
    pub const RIDER_NAME: &str = "Unknown Rider";
    pub const ELO: i32 = 1000;
}

/// Content classification
pub mod content {
    /// Highest rating a content item may carry
    pub const MAX_RATING: f64 = 5.0;

    /// Known track categories, matched case-insensitively
    pub const TRACK_CATEGORIES: [&str; 5] =
        ["Supercross", "Motocross", "FreeRide", "Training", "Enduro"];

    /// Download hosts in priority order; earlier entries win the primary slot
    pub const HOST_PRIORITY: [&str; 3] = ["mediafire.com", "drive.google.com", "mega.nz"];

    /// Hosts a download link may point at
    pub const ALLOWED_DOWNLOAD_HOSTS: [&str; 9] = [
        "mediafire.com",
        "drive.google.com",
        "mega.nz",
        "1drv.ms",
        "onedrive.live.com",
        "dropbox.com",
        "github.com",
        "mod.io",
        "mxb-mods.com",
    ];

    /// Link suffixes that point at images rather than downloads
    pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];
}

/// Domain manager tuning
pub mod listing {
    /// Number of tracks shown in the tracks listing
    pub const MAX_TRACKS_DISPLAYED: usize = 40;

    /// Minimum search length before a live search is issued
    pub const MIN_SEARCH_LENGTH: usize = 3;

    /// Rankings shown on the ranked page
    pub const RANKED_TOP_N: usize = 10;

    /// Rankings shown on the home page
    pub const HOME_TOP_N: usize = 3;

    /// Window for upcoming races in hours
    pub const UPCOMING_RACE_WINDOW_HOURS: i64 = 3;

    /// Failed loads a view offers to retry before giving up
    pub const MAX_VIEW_RETRIES: u32 = 3;
}

/// Environment variable names
pub mod env_vars {
    pub const PUBLIC_API_URL: &str = "MXB_PUBLIC_API_URL";
    pub const INTERNAL_API_URL: &str = "MXB_INTERNAL_API_URL";
    pub const STATIC_BASE: &str = "MXB_STATIC_BASE";
    pub const LOG_FILE: &str = "MXB_LOG_FILE";
    pub const HTTP_TIMEOUT: &str = "MXB_HTTP_TIMEOUT";
    pub const RATE_LIMIT: &str = "MXB_RATE_LIMIT";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_are_reasonable() {
        // Health probes must give up before a regular load does
        assert!(DEFAULT_HEALTH_TIMEOUT_SECONDS < DEFAULT_HTTP_TIMEOUT_SECONDS);
        assert!((10..=15).contains(&DEFAULT_LOAD_TIMEOUT_SECONDS));
        assert!(DEFAULT_HEALTH_REFRESH_SECONDS > DEFAULT_HEALTH_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_host_priority_is_allow_listed() {
        for host in content::HOST_PRIORITY {
            assert!(content::ALLOWED_DOWNLOAD_HOSTS.contains(&host));
        }
    }

    #[test]
    fn test_retry_constants_are_reasonable() {
        let max_attempts = retry::MAX_ATTEMPTS;
        let base_delay = retry::BASE_DELAY_MS;

        assert!(max_attempts > 0);
        assert!(base_delay > 0);
        assert!(retry::MAX_RATE_LIMITED_RETRIES > 0);
    }

    #[test]
    fn test_racing_ports_do_not_overlap_live_port() {
        let live = racing::LIVE_PORT;
        let range = racing::PORT_BASE..racing::PORT_BASE + racing::PORT_RANGE;
        assert!(!range.contains(&live));
    }

    #[test]
    fn test_default_rating_in_range() {
        assert!((0.0..=content::MAX_RATING).contains(&defaults::RATING));
    }
}
