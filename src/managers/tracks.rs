use tracing::{debug, info, warn};

use super::sort_content;
use super::state::ViewState;
use crate::constants::listing::MAX_TRACKS_DISPLAYED;
use crate::data_fetcher::models::{ContentItem, ContentType, LoadOptions, SortOrder};
use crate::data_fetcher::{DataEvent, DataManager};

/// Track listing with category, search and sort controls
#[derive(Debug)]
pub struct TracksManager {
    data: DataManager,
    tracks: Vec<ContentItem>,
    category: Option<String>,
    search: Option<String>,
    sort: SortOrder,
    state: ViewState,
}

impl TracksManager {
    pub fn new(data: DataManager) -> Self {
        Self {
            data,
            tracks: Vec::new(),
            category: None,
            search: None,
            sort: SortOrder::Popular,
            state: ViewState::default(),
        }
    }

    pub fn tracks(&self) -> &[ContentItem] {
        &self.tracks
    }

    pub fn track(&self, id: &str) -> Option<&ContentItem> {
        self.tracks.iter().find(|track| track.id == id)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.search = search;
    }

    /// Changes the order of the current listing without reloading
    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        sort_content(&mut self.tracks, sort);
    }

    fn options(&self) -> LoadOptions {
        let mut options = LoadOptions::new().with_sort(self.sort);
        options.category = self.category.clone();
        options.search = self.search.clone();
        options
    }

    /// Loads the listing. Premium tracks are hidden without premium access;
    /// at most [`MAX_TRACKS_DISPLAYED`] are kept. On failure the previous
    /// listing stays and the error goes to [`state`](Self::state).
    pub async fn load(&mut self) {
        self.state.start_loading();

        match self.data.load(ContentType::Tracks, self.options()).await {
            Ok(data) => {
                let show_premium = self.data.has_premium_access();
                let mut tracks: Vec<ContentItem> = data
                    .into_content()
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|track| show_premium || !track.premium)
                    .collect();
                sort_content(&mut tracks, self.sort);
                tracks.truncate(MAX_TRACKS_DISPLAYED);

                info!("Loaded {} tracks", tracks.len());
                self.tracks = tracks;
                self.state.finish();
            }
            Err(e) => {
                warn!("Failed to load tracks: {e}");
                self.state.fail(&e);
            }
        }
    }

    /// Drops cached track data and loads again
    pub async fn refresh(&mut self) {
        self.data.clear_cache(Some(ContentType::Tracks)).await;
        self.load().await;
    }

    /// Retries a failed load while the retry budget lasts
    pub async fn retry(&mut self) -> bool {
        if !self.state.can_retry() {
            return false;
        }
        debug!("Retrying track load (attempt {})", self.state.retry_count + 1);
        self.load().await;
        true
    }

    /// Reloads when track data changed upstream
    pub async fn handle_event(&mut self, event: DataEvent) -> bool {
        match event {
            DataEvent::Updated(ContentType::Tracks) => {
                self.load().await;
                true
            }
            DataEvent::Updated(_) => false,
        }
    }
}
