use super::lenient;
use crate::constants::defaults;
use crate::data_fetcher::models::{RankingEntry, RiderProfile};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct RawRanking {
    #[serde(default, alias = "position", deserialize_with = "lenient::unsigned")]
    rank: Option<u64>,
    #[serde(
        default,
        rename = "riderName",
        alias = "rider_name",
        alias = "name",
        alias = "username",
        deserialize_with = "lenient::string"
    )]
    rider_name: Option<String>,
    #[serde(
        default,
        alias = "elo_rating",
        alias = "eloRating",
        deserialize_with = "lenient::signed"
    )]
    elo: Option<i64>,
    #[serde(
        default,
        rename = "racesCompleted",
        alias = "races_completed",
        alias = "races",
        deserialize_with = "lenient::unsigned"
    )]
    races_completed: Option<u64>,
    #[serde(
        default,
        rename = "lastRaceAt",
        alias = "last_race_at",
        alias = "last_race",
        deserialize_with = "lenient::timestamp"
    )]
    last_race_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawRider {
    #[serde(default, deserialize_with = "lenient::id")]
    id: Option<String>,
    #[serde(
        default,
        alias = "username",
        alias = "rider_name",
        alias = "riderName",
        deserialize_with = "lenient::string"
    )]
    name: Option<String>,
    #[serde(
        default,
        alias = "elo_rating",
        alias = "eloRating",
        deserialize_with = "lenient::signed"
    )]
    elo: Option<i64>,
    #[serde(
        default,
        rename = "racesCompleted",
        alias = "races_completed",
        deserialize_with = "lenient::unsigned"
    )]
    races_completed: Option<u64>,
    #[serde(
        default,
        rename = "lastRaceAt",
        alias = "last_race_at",
        deserialize_with = "lenient::timestamp"
    )]
    last_race_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "isRaceManager",
        alias = "is_race_manager",
        deserialize_with = "lenient::boolean"
    )]
    is_race_manager: Option<bool>,
    #[serde(default)]
    permissions: Option<Value>,
    #[serde(default, rename = "linkedAccounts", alias = "linked_accounts")]
    linked_accounts: Option<Value>,
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Orders entries by upstream rank (unranked entries last, by elo) and
/// renumbers them densely from 1
pub fn normalize_rankings(records: &[Value]) -> Vec<RankingEntry> {
    let mut parsed: Vec<(Option<u64>, RankingEntry)> = records
        .iter()
        .filter_map(|raw| match serde_json::from_value::<RawRanking>(raw.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable ranking record: {e}");
                None
            }
        })
        .map(|raw| {
            (
                raw.rank.filter(|rank| *rank > 0),
                RankingEntry {
                    rank: 0,
                    rider_name: raw
                        .rider_name
                        .unwrap_or_else(|| defaults::RIDER_NAME.to_string()),
                    elo: raw.elo.map(clamp_i32).unwrap_or(defaults::ELO),
                    races_completed: raw.races_completed.map(saturate).unwrap_or(0),
                    last_race_at: raw.last_race_at,
                },
            )
        })
        .collect();

    parsed.sort_by(|(rank_a, a), (rank_b, b)| {
        rank_a
            .is_none()
            .cmp(&rank_b.is_none())
            .then(rank_a.cmp(rank_b))
            .then(b.elo.cmp(&a.elo))
            .then(a.rider_name.cmp(&b.rider_name))
    });

    let entries: Vec<RankingEntry> = parsed
        .into_iter()
        .enumerate()
        .map(|(index, (_, mut entry))| {
            entry.rank = saturate(index as u64 + 1);
            entry
        })
        .collect();
    debug!("Normalized {} ranking entries", entries.len());
    entries
}

fn linked_account_handle(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => ["username", "name", "id"]
            .iter()
            .find_map(|key| map.get(*key).and_then(lenient::coerce_string)),
        other => lenient::coerce_string(other),
    }
}

fn normalize_rider(raw: RawRider) -> Option<RiderProfile> {
    let Some(id) = raw.id else {
        warn!("Dropping rider record without an id");
        return None;
    };

    let is_race_manager = raw.is_race_manager.or_else(|| {
        raw.permissions.as_ref().and_then(|permissions| {
            ["isRaceManager", "is_race_manager", "race_manager"]
                .iter()
                .find_map(|key| permissions.get(*key).and_then(lenient::coerce_bool))
        })
    });

    let linked_accounts: BTreeMap<String, String> = match raw.linked_accounts {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(provider, value)| {
                linked_account_handle(value).map(|handle| (provider.clone(), handle))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    Some(RiderProfile {
        id,
        name: raw.name.unwrap_or_else(|| defaults::RIDER_NAME.to_string()),
        elo: raw.elo.map(clamp_i32).unwrap_or(defaults::ELO),
        races_completed: raw.races_completed.map(saturate).unwrap_or(0),
        last_race_at: raw.last_race_at,
        is_race_manager: is_race_manager.unwrap_or(false),
        linked_accounts,
    })
}

pub fn normalize_riders(records: &[Value]) -> Vec<RiderProfile> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|raw| match serde_json::from_value::<RawRider>(raw.clone()) {
            Ok(rider) => Some(rider),
            Err(e) => {
                warn!("Skipping unreadable rider record: {e}");
                None
            }
        })
        .filter_map(normalize_rider)
        .filter(|rider| seen.insert(rider.id.clone()))
        .collect()
}
