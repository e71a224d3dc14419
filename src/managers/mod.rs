//! Domain managers: listings built on top of the [`DataManager`].
//!
//! Each manager receives a `DataManager` handle at construction, keeps its
//! own listing and [`ViewState`], and folds load failures into that state so
//! callers can show a retry affordance.
//!
//! [`DataManager`]: crate::data_fetcher::DataManager

pub mod downloads;
pub mod profile;
pub mod racing;
pub mod ranked;
pub mod state;
pub mod tracks;

pub use downloads::DownloadsManager;
pub use profile::ProfileManager;
pub use racing::RacingManager;
pub use ranked::RankedManager;
pub use state::ViewState;
pub use tracks::TracksManager;

use std::cmp::Reverse;

use crate::data_fetcher::models::{ContentItem, SortOrder};

/// Orders catalog items for display. Ties keep name order.
pub fn sort_content(items: &mut [ContentItem], order: SortOrder) {
    items.sort_by(|a, b| a.name.cmp(&b.name));
    match order {
        SortOrder::Newest => items.sort_by_key(|item| Reverse(item.created_at)),
        SortOrder::Downloads => items.sort_by_key(|item| Reverse(item.downloads.count)),
        SortOrder::Popular => items.sort_by(|a, b| {
            b.downloads
                .count
                .cmp(&a.downloads.count)
                .then_with(|| b.rating.total_cmp(&a.rating))
        }),
        SortOrder::Rating => items.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
    }
}
