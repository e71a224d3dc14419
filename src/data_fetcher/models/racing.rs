use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a race event. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaceStatus {
    Waiting,
    InProgress,
    Ended,
}

impl RaceStatus {
    /// Maps upstream status labels onto the lifecycle. Unknown labels are
    /// treated as not yet started.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "in_progress" | "inprogress" | "live" | "racing" | "started" => {
                RaceStatus::InProgress
            }
            "ended" | "closed" | "finished" | "complete" | "completed" => RaceStatus::Ended,
            _ => RaceStatus::Waiting,
        }
    }

    pub fn can_transition_to(&self, next: RaceStatus) -> bool {
        next >= *self
    }
}

impl fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RaceStatus::Waiting => "WAITING",
            RaceStatus::InProgress => "IN_PROGRESS",
            RaceStatus::Ended => "ENDED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceEvent {
    pub id: String,
    pub name: String,
    pub status: RaceStatus,
    #[serde(rename = "trackId")]
    pub track_id: Option<String>,
    pub format: String,
    #[serde(rename = "maxRiders")]
    pub max_riders: u32,
    #[serde(rename = "currentRiders")]
    pub current_riders: u32,
    #[serde(rename = "startTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RaceEvent {
    /// Moves the race forward in its lifecycle.
    ///
    /// Returns `false` and leaves the status untouched when `next` would move
    /// the race backwards.
    pub fn advance(&mut self, next: RaceStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    pub fn is_full(&self) -> bool {
        self.current_riders >= self.max_riders
    }

    pub fn open_slots(&self) -> u32 {
        self.max_riders.saturating_sub(self.current_riders)
    }
}
