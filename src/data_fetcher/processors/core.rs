use super::content::normalize_content;
use super::racing::normalize_races;
use super::rankings::{normalize_rankings, normalize_riders};
use crate::data_fetcher::models::{ContentType, NormalizedData};
use crate::error::AppError;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// Wrapper keys checked for every content type, in order
const COMMON_WRAPPERS: [&str; 3] = ["items", "data", "results"];

fn type_wrappers(content_type: ContentType) -> &'static [&'static str] {
    match content_type {
        ContentType::Tracks => &["tracks"],
        ContentType::Mods => &["mods"],
        ContentType::Downloads => &["downloads"],
        ContentType::Races => &["races", "events"],
        ContentType::Rankings => &["rankings", "top_10", "leaderboard"],
        ContentType::Riders => &["riders", "profile", "rider"],
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An object whose every value is itself an object is a keyed map of
/// records, like the public mods listing keyed by page URL
fn is_keyed_map(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.values().all(Value::is_object)
}

/// An object carrying its own identity is one record, even when one of its
/// fields shares a name with a wrapper key (a download's `downloads` field)
fn is_single_record(map: &Map<String, Value>) -> bool {
    if is_keyed_map(map) {
        return false;
    }
    let has_id = map.get("id").is_some_and(|id| id.is_string() || id.is_number());
    let named = ["name", "title"]
        .iter()
        .any(|key| map.get(*key).is_some_and(Value::is_string));
    has_id || (named && !COMMON_WRAPPERS.iter().any(|key| map.contains_key(*key)))
}

fn keyed_map_records(map: &Map<String, Value>) -> Vec<Value> {
    map.iter()
        .map(|(key, value)| {
            let mut record = value.clone();
            if let Value::Object(fields) = &mut record
                && !fields.contains_key("id")
            {
                fields.insert("id".to_string(), Value::String(key.clone()));
            }
            record
        })
        .collect()
}

/// Pulls the list of raw records out of any accepted payload shape.
///
/// Accepts a bare array, an object wrapping an array (or a single record)
/// under a known key, a keyed map of records, or a single record. Scalars
/// and null are rejected.
pub fn extract_records(payload: &Value, content_type: ContentType) -> Result<Vec<Value>, AppError> {
    match payload {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(map) if is_single_record(map) => Ok(vec![payload.clone()]),
        Value::Object(map) => {
            let wrapped = COMMON_WRAPPERS
                .iter()
                .chain(type_wrappers(content_type))
                .find_map(|key| map.get(*key).map(|inner| (*key, inner)));

            match wrapped {
                Some((key, Value::Array(items))) => {
                    debug!("Unwrapped {} {content_type} records from '{key}'", items.len());
                    Ok(items.clone())
                }
                Some((key, Value::Object(inner))) if is_keyed_map(inner) && key != "profile" => {
                    Ok(keyed_map_records(inner))
                }
                Some((_, inner @ Value::Object(_))) => Ok(vec![inner.clone()]),
                Some((key, Value::Null)) => {
                    debug!("'{key}' wrapper for {content_type} is null");
                    Ok(Vec::new())
                }
                Some((key, other)) => Err(AppError::validation(format!(
                    "Unexpected {} under '{key}' in {content_type} payload",
                    describe(other)
                ))),
                None if is_keyed_map(map) => Ok(keyed_map_records(map)),
                None => Ok(vec![payload.clone()]),
            }
        }
        other => Err(AppError::validation(format!(
            "Invalid {content_type} payload: expected an array or object, got {}",
            describe(other)
        ))),
    }
}

/// Normalizes a raw upstream payload into canonical records.
///
/// Normalizing the serialized output a second time yields the same result.
#[instrument(skip(payload))]
pub fn normalize(payload: &Value, content_type: ContentType) -> Result<NormalizedData, AppError> {
    let records = extract_records(payload, content_type)?;
    let data = match content_type {
        ContentType::Tracks | ContentType::Mods | ContentType::Downloads => {
            NormalizedData::Content(normalize_content(&records, content_type))
        }
        ContentType::Races => NormalizedData::Races(normalize_races(&records)),
        ContentType::Rankings => NormalizedData::Rankings(normalize_rankings(&records)),
        ContentType::Riders => NormalizedData::Riders(normalize_riders(&records)),
    };
    debug!("Normalized {content_type} payload into {} records", data.len());
    Ok(data)
}

/// Parses and normalizes a JSON document, as served by static fallbacks
pub fn normalize_text(text: &str, content_type: ContentType) -> Result<NormalizedData, AppError> {
    let payload: Value = serde_json::from_str(text)?;
    normalize(&payload, content_type)
}
