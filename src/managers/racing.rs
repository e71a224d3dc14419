use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::state::ViewState;
use crate::constants::listing::UPCOMING_RACE_WINDOW_HOURS;
use crate::data_fetcher::models::{ContentType, LoadOptions, RaceEvent, RaceStatus};
use crate::data_fetcher::DataManager;

/// Races starting within `window` of `now`, soonest first
pub fn upcoming_races(races: &[RaceEvent], now: DateTime<Utc>, window: Duration) -> Vec<RaceEvent> {
    let mut upcoming: Vec<RaceEvent> = races
        .iter()
        .filter(|race| race.status != RaceStatus::Ended)
        .filter(|race| {
            race.start_time
                .is_some_and(|start| start >= now && start - now <= window)
        })
        .cloned()
        .collect();
    upcoming.sort_by_key(|race| race.start_time);
    upcoming
}

/// A rider can still enter a race that is waiting and not full
pub fn is_joinable(race: &RaceEvent) -> bool {
    race.status == RaceStatus::Waiting && !race.is_full()
}

/// "Starts in 1h 5m" style countdown; `None` once the race has started
pub fn format_time_until(start: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    let diff = start - now;
    if diff < Duration::zero() {
        return None;
    }
    let hours = diff.num_hours();
    let minutes = diff.num_minutes() % 60;
    if hours > 0 {
        Some(format!("Starts in {hours}h {minutes}m"))
    } else {
        Some(format!("Starts in {minutes}m"))
    }
}

#[derive(Debug)]
pub struct RacingManager {
    data: DataManager,
    races: Vec<RaceEvent>,
    window: Duration,
    state: ViewState,
}

impl RacingManager {
    pub fn new(data: DataManager) -> Self {
        Self {
            data,
            races: Vec::new(),
            window: Duration::hours(UPCOMING_RACE_WINDOW_HOURS),
            state: ViewState::default(),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn races(&self) -> &[RaceEvent] {
        &self.races
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn has_access(&self) -> bool {
        self.data.has_racing_access()
    }

    pub fn joinable_races(&self) -> impl Iterator<Item = &RaceEvent> {
        self.races.iter().filter(|race| is_joinable(race))
    }

    /// Loads races starting within the window from now
    pub async fn load_upcoming(&mut self) {
        self.load_upcoming_at(Utc::now()).await;
    }

    pub async fn load_upcoming_at(&mut self, now: DateTime<Utc>) {
        self.state.start_loading();
        match self.data.load(ContentType::Races, LoadOptions::new()).await {
            Ok(data) => {
                let races = data.into_races().unwrap_or_default();
                self.races = upcoming_races(&races, now, self.window);
                info!("{} of {} races are upcoming", self.races.len(), races.len());
                self.state.finish();
            }
            Err(e) => {
                warn!("Failed to load races: {e}");
                self.state.fail(&e);
            }
        }
    }

    /// Loads one race. The request goes to the race's dedicated port.
    pub async fn load_race(&mut self, race_id: &str) -> Option<RaceEvent> {
        self.state.start_loading();
        let options = LoadOptions::new().with_race_id(race_id);
        match self.data.load(ContentType::Races, options).await {
            Ok(data) => {
                self.state.finish();
                data.into_races()
                    .unwrap_or_default()
                    .into_iter()
                    .find(|race| race.id == race_id)
            }
            Err(e) => {
                warn!("Failed to load race {race_id}: {e}");
                self.state.fail(&e);
                None
            }
        }
    }
}
