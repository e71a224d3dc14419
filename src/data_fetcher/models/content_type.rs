use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A category of data the manager loads; the primary cache and routing
/// discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Tracks,
    Mods,
    Downloads,
    Races,
    Rankings,
    Riders,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::Tracks,
        ContentType::Mods,
        ContentType::Downloads,
        ContentType::Races,
        ContentType::Rankings,
        ContentType::Riders,
    ];

    /// Path segment used in API URLs, static file names and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Tracks => "tracks",
            ContentType::Mods => "mods",
            ContentType::Downloads => "downloads",
            ContentType::Races => "races",
            ContentType::Rankings => "rankings",
            ContentType::Riders => "riders",
        }
    }

    /// Types served by the internal racing backend
    pub fn requires_internal_source(&self) -> bool {
        matches!(
            self,
            ContentType::Races | ContentType::Rankings | ContentType::Riders
        )
    }

    /// Types whose records normalize into `ContentItem`
    pub fn is_catalog(&self) -> bool {
        matches!(
            self,
            ContentType::Tracks | ContentType::Mods | ContentType::Downloads
        )
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("content type must not be empty"));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "tracks" | "track" => Ok(ContentType::Tracks),
            "mods" | "mod" => Ok(ContentType::Mods),
            "downloads" | "download" => Ok(ContentType::Downloads),
            "races" | "race" | "racing" => Ok(ContentType::Races),
            "rankings" | "ranking" | "ranked" => Ok(ContentType::Rankings),
            "riders" | "rider" | "profile" | "profiles" => Ok(ContentType::Riders),
            other => Err(AppError::validation(format!(
                "unknown content type '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_types_and_aliases() {
        assert_eq!("tracks".parse::<ContentType>().unwrap(), ContentType::Tracks);
        assert_eq!(" Mods ".parse::<ContentType>().unwrap(), ContentType::Mods);
        assert_eq!("ranked".parse::<ContentType>().unwrap(), ContentType::Rankings);
        assert_eq!("racing".parse::<ContentType>().unwrap(), ContentType::Races);
        assert_eq!("profile".parse::<ContentType>().unwrap(), ContentType::Riders);
    }

    #[test]
    fn test_parse_rejects_empty_and_unknown() {
        assert!(matches!(
            "".parse::<ContentType>(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            "   ".parse::<ContentType>(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            "payments".parse::<ContentType>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_round_trip_through_as_str() {
        for content_type in ContentType::ALL {
            assert_eq!(
                content_type.as_str().parse::<ContentType>().unwrap(),
                content_type
            );
        }
    }

    #[test]
    fn test_internal_routing_types() {
        assert!(ContentType::Races.requires_internal_source());
        assert!(ContentType::Rankings.requires_internal_source());
        assert!(ContentType::Riders.requires_internal_source());
        assert!(!ContentType::Tracks.requires_internal_source());
        assert!(!ContentType::Mods.requires_internal_source());
        assert!(!ContentType::Downloads.requires_internal_source());
    }
}
