use super::content::ContentItem;
use super::racing::RaceEvent;
use super::rankings::{RankingEntry, RiderProfile};
use serde::Serialize;

/// Normalized payload for one content type.
///
/// Serializes as the bare array of records so that a normalized payload can
/// be fed back through the normalizer unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedData {
    Content(Vec<ContentItem>),
    Races(Vec<RaceEvent>),
    Rankings(Vec<RankingEntry>),
    Riders(Vec<RiderProfile>),
}

impl NormalizedData {
    pub fn len(&self) -> usize {
        match self {
            NormalizedData::Content(items) => items.len(),
            NormalizedData::Races(races) => races.len(),
            NormalizedData::Rankings(entries) => entries.len(),
            NormalizedData::Riders(riders) => riders.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_content(&self) -> Option<&[ContentItem]> {
        match self {
            NormalizedData::Content(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_races(&self) -> Option<&[RaceEvent]> {
        match self {
            NormalizedData::Races(races) => Some(races),
            _ => None,
        }
    }

    pub fn as_rankings(&self) -> Option<&[RankingEntry]> {
        match self {
            NormalizedData::Rankings(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_riders(&self) -> Option<&[RiderProfile]> {
        match self {
            NormalizedData::Riders(riders) => Some(riders),
            _ => None,
        }
    }

    pub fn into_content(self) -> Option<Vec<ContentItem>> {
        match self {
            NormalizedData::Content(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_races(self) -> Option<Vec<RaceEvent>> {
        match self {
            NormalizedData::Races(races) => Some(races),
            _ => None,
        }
    }

    pub fn into_rankings(self) -> Option<Vec<RankingEntry>> {
        match self {
            NormalizedData::Rankings(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn into_riders(self) -> Option<Vec<RiderProfile>> {
        match self {
            NormalizedData::Riders(riders) => Some(riders),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing_utils::TestDataBuilder;

    #[test]
    fn test_serializes_as_bare_array() {
        let data = NormalizedData::Content(vec![TestDataBuilder::create_track(
            "t1",
            "Club MX",
            "Motocross",
        )]);
        let value = serde_json::to_value(&data).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_accessors_match_variant() {
        let data = NormalizedData::Rankings(vec![TestDataBuilder::create_ranking(1, "A", 1500)]);
        assert_eq!(data.len(), 1);
        assert!(data.as_rankings().is_some());
        assert!(data.as_content().is_none());
        assert!(data.clone().into_races().is_none());
        assert_eq!(data.into_rankings().unwrap()[0].rider_name, "A");
    }

    #[test]
    fn test_empty() {
        assert!(NormalizedData::Races(vec![]).is_empty());
    }
}
