use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: u32,
    #[serde(rename = "riderName")]
    pub rider_name: String,
    pub elo: i32,
    #[serde(rename = "racesCompleted")]
    pub races_completed: u32,
    #[serde(rename = "lastRaceAt")]
    pub last_race_at: Option<DateTime<Utc>>,
}

/// Checks that ranks run 1, 2, 3, ... without gaps or repeats
pub fn is_dense_ranking(entries: &[RankingEntry]) -> bool {
    entries
        .iter()
        .enumerate()
        .all(|(index, entry)| entry.rank as usize == index + 1)
}

/// A rider profile as served by the internal API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderProfile {
    pub id: String,
    pub name: String,
    pub elo: i32,
    #[serde(rename = "racesCompleted")]
    pub races_completed: u32,
    #[serde(rename = "lastRaceAt")]
    pub last_race_at: Option<DateTime<Utc>>,
    #[serde(rename = "isRaceManager")]
    pub is_race_manager: bool,
    /// Linked account provider -> account handle
    #[serde(rename = "linkedAccounts")]
    pub linked_accounts: BTreeMap<String, String>,
}
