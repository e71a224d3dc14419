pub mod common;
pub mod content;
pub mod content_type;
pub mod options;
pub mod racing;
pub mod rankings;

pub use common::NormalizedData;
pub use content::{ContentItem, DownloadInfo};
pub use content_type::ContentType;
pub use options::{LoadOptions, SortOrder};
pub use racing::{RaceEvent, RaceStatus};
pub use rankings::{RankingEntry, RiderProfile, is_dense_ranking};
