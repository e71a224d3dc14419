use tracing::warn;

use super::state::ViewState;
use crate::constants::listing::{HOME_TOP_N, RANKED_TOP_N};
use crate::data_fetcher::models::{ContentType, LoadOptions, RankingEntry};
use crate::data_fetcher::DataManager;

/// Ranked leaderboard: the top listing and the home-page summary
#[derive(Debug)]
pub struct RankedManager {
    data: DataManager,
    rankings: Vec<RankingEntry>,
    state: ViewState,
}

impl RankedManager {
    pub fn new(data: DataManager) -> Self {
        Self {
            data,
            rankings: Vec::new(),
            state: ViewState::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Top [`RANKED_TOP_N`] riders, rank 1 first
    pub fn top(&self) -> &[RankingEntry] {
        &self.rankings
    }

    /// Top [`HOME_TOP_N`] riders for the home page
    pub fn home_top(&self) -> &[RankingEntry] {
        &self.rankings[..self.rankings.len().min(HOME_TOP_N)]
    }

    pub fn rank_of(&self, rider_name: &str) -> Option<u32> {
        self.rankings
            .iter()
            .find(|entry| entry.rider_name.eq_ignore_ascii_case(rider_name))
            .map(|entry| entry.rank)
    }

    pub async fn load(&mut self) {
        self.state.start_loading();
        match self.data.load(ContentType::Rankings, LoadOptions::new()).await {
            Ok(data) => {
                let mut rankings = data.into_rankings().unwrap_or_default();
                rankings.truncate(RANKED_TOP_N);
                self.rankings = rankings;
                self.state.finish();
            }
            Err(e) => {
                warn!("Failed to load rankings: {e}");
                self.state.fail(&e);
            }
        }
    }

    pub async fn refresh(&mut self) {
        self.data.clear_cache(Some(ContentType::Rankings)).await;
        self.load().await;
    }
}
