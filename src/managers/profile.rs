use tracing::{info, warn};

use super::state::ViewState;
use crate::data_fetcher::models::{ContentType, LoadOptions, RiderProfile};
use crate::data_fetcher::DataManager;
use crate::error::AppError;

/// Loads and holds one rider profile
#[derive(Debug)]
pub struct ProfileManager {
    data: DataManager,
    profile: Option<RiderProfile>,
    state: ViewState,
}

impl ProfileManager {
    pub fn new(data: DataManager) -> Self {
        Self {
            data,
            profile: None,
            state: ViewState::default(),
        }
    }

    pub fn profile(&self) -> Option<&RiderProfile> {
        self.profile.as_ref()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_race_manager(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_race_manager)
    }

    /// Linked account name for a platform, e.g. `"discord"`
    pub fn linked_account(&self, platform: &str) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.linked_accounts.get(platform))
            .map(String::as_str)
    }

    /// Loads the profile for `rider_id`. A missing rider is reported like any
    /// other failed load.
    pub async fn load(&mut self, rider_id: &str) {
        self.state.start_loading();
        let options = LoadOptions::new().with_id(rider_id);

        let found = self
            .data
            .load(ContentType::Riders, options)
            .await
            .and_then(|data| {
                data.into_riders()
                    .unwrap_or_default()
                    .into_iter()
                    .find(|rider| rider.id == rider_id)
                    .ok_or_else(|| AppError::data_unavailable(format!("rider {rider_id}")))
            });

        match found {
            Ok(profile) => {
                info!("Loaded profile for {}", profile.name);
                self.profile = Some(profile);
                self.state.finish();
            }
            Err(e) => {
                warn!("Failed to load profile {rider_id}: {e}");
                self.profile = None;
                self.state.fail(&e);
            }
        }
    }
}
