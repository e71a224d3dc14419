use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::sort_content;
use super::state::ViewState;
use crate::constants::listing::MIN_SEARCH_LENGTH;
use crate::data_fetcher::models::{ContentItem, ContentType, LoadOptions, SortOrder};
use crate::data_fetcher::DataManager;

/// Paginated download listing.
///
/// Pages accumulate by id; an empty page ends pagination.
#[derive(Debug)]
pub struct DownloadsManager {
    data: DataManager,
    downloads: Vec<ContentItem>,
    seen: HashSet<String>,
    page: u32,
    has_more: bool,
    search: Option<String>,
    category: Option<String>,
    sort: SortOrder,
    state: ViewState,
}

impl DownloadsManager {
    pub fn new(data: DataManager) -> Self {
        Self {
            data,
            downloads: Vec::new(),
            seen: HashSet::new(),
            page: 1,
            has_more: true,
            search: None,
            category: None,
            sort: SortOrder::Newest,
            state: ViewState::default(),
        }
    }

    pub fn downloads(&self) -> &[ContentItem] {
        &self.downloads
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        sort_content(&mut self.downloads, sort);
    }

    /// Clears the listing and loads page 1
    pub async fn load_first_page(&mut self) {
        self.downloads.clear();
        self.seen.clear();
        self.page = 1;
        self.has_more = true;
        self.load_page().await;
    }

    /// Loads the next page, if there is one
    pub async fn load_more(&mut self) -> bool {
        if !self.has_more || self.state.loading {
            return false;
        }
        self.page += 1;
        self.load_page().await;
        true
    }

    /// Applies a search query. Queries of at least [`MIN_SEARCH_LENGTH`]
    /// characters start a new search; shorter ones reset to the unfiltered
    /// listing. Returns whether a load ran.
    pub async fn search(&mut self, query: &str) -> bool {
        let query = query.trim();
        let next = (query.chars().count() >= MIN_SEARCH_LENGTH).then(|| query.to_string());

        if next.is_none() && self.search.is_none() && !self.downloads.is_empty() {
            debug!("Search '{query}' too short, listing already unfiltered");
            return false;
        }

        self.search = next;
        self.load_first_page().await;
        true
    }

    async fn load_page(&mut self) {
        self.state.start_loading();
        let mut options = LoadOptions::new().with_page(self.page).with_sort(self.sort);
        options.search = self.search.clone();
        options.category = self.category.clone();

        match self.data.load(ContentType::Downloads, options).await {
            Ok(data) => {
                let page = data.into_content().unwrap_or_default();
                if page.is_empty() {
                    debug!("Downloads page {} is empty", self.page);
                    self.has_more = false;
                }
                let before = self.downloads.len();
                for item in page {
                    if self.seen.insert(item.id.clone()) {
                        self.downloads.push(item);
                    }
                }
                sort_content(&mut self.downloads, self.sort);
                info!(
                    "Downloads page {} added {} items",
                    self.page,
                    self.downloads.len() - before
                );
                self.state.finish();
            }
            Err(e) => {
                warn!("Failed to load downloads page {}: {e}", self.page);
                if self.page > 1 {
                    self.page -= 1;
                }
                self.state.fail(&e);
            }
        }
    }
}
