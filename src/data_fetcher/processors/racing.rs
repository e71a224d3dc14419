use super::lenient;
use crate::constants::defaults;
use crate::data_fetcher::models::{RaceEvent, RaceStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Per-class entry counts some race payloads carry instead of totals
#[derive(Debug, Deserialize)]
struct RawRaceClass {
    #[serde(default, alias = "current_riders", deserialize_with = "lenient::unsigned")]
    entries: Option<u64>,
    #[serde(
        default,
        alias = "max_entries",
        alias = "maxEntries",
        deserialize_with = "lenient::unsigned"
    )]
    max_riders: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawRace {
    #[serde(default, deserialize_with = "lenient::id")]
    id: Option<String>,
    #[serde(default, alias = "title", deserialize_with = "lenient::string")]
    name: Option<String>,
    #[serde(default, alias = "state", deserialize_with = "lenient::string")]
    status: Option<String>,
    #[serde(
        default,
        rename = "trackId",
        alias = "track_id",
        deserialize_with = "lenient::id"
    )]
    track_id: Option<String>,
    #[serde(default)]
    track: Option<Value>,
    #[serde(default, alias = "race_format", deserialize_with = "lenient::string")]
    format: Option<String>,
    #[serde(
        default,
        rename = "maxRiders",
        alias = "max_riders",
        alias = "max_entries",
        deserialize_with = "lenient::unsigned"
    )]
    max_riders: Option<u64>,
    #[serde(
        default,
        rename = "currentRiders",
        alias = "current_riders",
        alias = "entries",
        deserialize_with = "lenient::unsigned"
    )]
    current_riders: Option<u64>,
    #[serde(default, deserialize_with = "lenient::shape")]
    classes: Option<Vec<RawRaceClass>>,
    #[serde(
        default,
        rename = "startTime",
        alias = "start_time",
        alias = "starts_at",
        deserialize_with = "lenient::timestamp"
    )]
    start_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "createdAt",
        alias = "created_at",
        deserialize_with = "lenient::timestamp"
    )]
    created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "updatedAt",
        alias = "updated_at",
        deserialize_with = "lenient::timestamp"
    )]
    updated_at: Option<DateTime<Utc>>,
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn class_total(classes: &[RawRaceClass], pick: impl Fn(&RawRaceClass) -> Option<u64>) -> Option<u64> {
    classes
        .iter()
        .filter_map(pick)
        .fold(None, |total: Option<u64>, value| {
            Some(total.map_or(value, |total| total.saturating_add(value)))
        })
}

fn normalize_race(raw: RawRace) -> Option<RaceEvent> {
    let Some(id) = raw.id else {
        warn!("Dropping race record without an id");
        return None;
    };

    let classes = raw.classes.unwrap_or_default();
    let max_riders = raw
        .max_riders
        .or_else(|| class_total(&classes, |c| c.max_riders))
        .map(saturate)
        .unwrap_or(defaults::RACE_MAX_RIDERS);
    let current_riders = raw
        .current_riders
        .or_else(|| class_total(&classes, |c| c.entries))
        .map(saturate)
        .unwrap_or(0)
        .min(max_riders);

    let track_id = raw.track_id.or_else(|| match &raw.track {
        Some(Value::Object(map)) => map.get("id").and_then(lenient::coerce_string),
        Some(other) => lenient::coerce_string(other),
        None => None,
    });

    Some(RaceEvent {
        id,
        name: raw.name.unwrap_or_else(|| defaults::RACE_NAME.to_string()),
        status: raw
            .status
            .as_deref()
            .map(RaceStatus::from_label)
            .unwrap_or(RaceStatus::Waiting),
        track_id,
        format: raw
            .format
            .unwrap_or_else(|| defaults::RACE_FORMAT.to_string()),
        max_riders,
        current_riders,
        start_time: raw.start_time,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

pub fn normalize_races(records: &[Value]) -> Vec<RaceEvent> {
    let mut seen = HashSet::new();
    let races: Vec<RaceEvent> = records
        .iter()
        .filter_map(|raw| match serde_json::from_value::<RawRace>(raw.clone()) {
            Ok(race) => Some(race),
            Err(e) => {
                warn!("Skipping unreadable race record: {e}");
                None
            }
        })
        .filter_map(normalize_race)
        .filter(|race| seen.insert(race.id.clone()))
        .collect();
    debug!("Normalized {} of {} race records", races.len(), records.len());
    races
}
