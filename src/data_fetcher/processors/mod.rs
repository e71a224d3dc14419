pub mod content;
pub mod core;
pub mod download_links;
pub mod lenient;
pub mod racing;
pub mod rankings;

pub use content::{normalize_category, normalize_content, normalize_rating, resolve_image};
pub use core::{extract_records, normalize, normalize_text};
pub use download_links::{consolidate_downloads, host_rank, validate_download_link};
pub use racing::normalize_races;
pub use rankings::{normalize_rankings, normalize_riders};
