use super::download_links::{
    collect_candidate_links, consolidate_downloads, extract_download_count, extract_links_from_text,
};
use super::lenient;
use crate::constants::content::{MAX_RATING, TRACK_CATEGORIES};
use crate::constants::defaults;
use crate::data_fetcher::models::{ContentItem, ContentType};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Image field shapes: a bare list or a cover plus gallery
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawImages {
    List(Vec<Value>),
    Set {
        #[serde(default)]
        cover: Option<Value>,
        #[serde(default)]
        gallery: Vec<Value>,
    },
}

#[derive(Debug, Deserialize)]
struct RawContentRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    id: Option<String>,
    #[serde(default, alias = "title", deserialize_with = "lenient::string")]
    name: Option<String>,
    #[serde(default, alias = "author", deserialize_with = "lenient::string")]
    creator: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    category: Option<String>,
    #[serde(default, alias = "image", deserialize_with = "lenient::string")]
    thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient::shape")]
    images: Option<RawImages>,
    #[serde(
        default,
        rename = "additionalImages",
        alias = "additional_images",
        deserialize_with = "lenient::shape"
    )]
    additional_images: Option<Vec<Value>>,
    #[serde(default)]
    downloads: Option<Value>,
    #[serde(
        default,
        rename = "downloadCount",
        alias = "download_count",
        deserialize_with = "lenient::unsigned"
    )]
    download_count: Option<u64>,
    #[serde(default, alias = "download_links")]
    links: Option<Value>,
    #[serde(default, rename = "downloadUrl", alias = "download_url")]
    download_url: Option<Value>,
    #[serde(default, deserialize_with = "lenient::number")]
    rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string")]
    difficulty: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    length: Option<String>,
    #[serde(
        default,
        alias = "isPremium",
        alias = "is_premium",
        deserialize_with = "lenient::boolean"
    )]
    premium: Option<bool>,
    #[serde(default, deserialize_with = "lenient::string")]
    version: Option<String>,
    #[serde(
        default,
        rename = "createdAt",
        alias = "created_at",
        alias = "addedAt",
        alias = "added_at",
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

/// Matches known categories case-insensitively; anything else keeps its
/// trimmed spelling
pub fn normalize_category(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return defaults::CATEGORY.to_string();
    };
    TRACK_CATEGORIES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(raw))
        .map(|known| known.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Ratings outside 0..=5 are treated as missing
pub fn normalize_rating(raw: Option<f64>) -> f64 {
    match raw {
        Some(rating) if (0.0..=MAX_RATING).contains(&rating) => rating,
        Some(rating) => {
            debug!("Discarding out of range rating {rating}");
            defaults::RATING
        }
        None => defaults::RATING,
    }
}

/// Resolves an image reference to an absolute http(s) URL or a site-rooted
/// path. Relative `../` references are rooted at the site.
pub fn resolve_image(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Url::parse(raw).ok().map(|url| url.to_string());
    }
    if raw.starts_with('/') && !raw.starts_with("//") {
        return Some(raw.to_string());
    }
    let mut rest = raw;
    while let Some(stripped) = rest.strip_prefix("../").or_else(|| rest.strip_prefix("./")) {
        rest = stripped;
    }
    (rest.len() != raw.len() && !rest.is_empty()).then(|| format!("/{rest}"))
}

fn gallery_images(record: &RawContentRecord) -> (Option<String>, Vec<String>) {
    let mut cover = None;
    let mut raw_gallery: Vec<&Value> = Vec::new();
    match &record.images {
        Some(RawImages::List(items)) => raw_gallery.extend(items),
        Some(RawImages::Set {
            cover: set_cover,
            gallery,
        }) => {
            cover = set_cover
                .as_ref()
                .and_then(lenient::coerce_string)
                .and_then(|s| resolve_image(&s));
            raw_gallery.extend(gallery);
        }
        None => {}
    }
    if let Some(extra) = &record.additional_images {
        raw_gallery.extend(extra);
    }

    let mut seen = HashSet::new();
    let images = raw_gallery
        .into_iter()
        .filter_map(lenient::coerce_string)
        .filter_map(|s| resolve_image(&s))
        .filter(|image| seen.insert(image.clone()))
        .collect();
    (cover, images)
}

fn normalize_record(record: RawContentRecord, content_type: ContentType) -> Option<ContentItem> {
    let Some(id) = record.id.clone() else {
        warn!("Dropping {content_type} record without an id");
        return None;
    };

    let (cover, images) = gallery_images(&record);
    let thumbnail = record
        .thumbnail
        .as_deref()
        .and_then(resolve_image)
        .or(cover)
        .unwrap_or_else(|| defaults::THUMBNAIL.to_string());

    let mut candidates = Vec::new();
    for source in [&record.downloads, &record.links, &record.download_url]
        .into_iter()
        .flatten()
    {
        collect_candidate_links(source, &mut candidates);
    }
    let description = record
        .description
        .unwrap_or_else(|| defaults::DESCRIPTION.to_string());
    candidates.extend(extract_links_from_text(&description));
    let count = record
        .download_count
        .or_else(|| extract_download_count(record.downloads.as_ref()))
        .unwrap_or(0);

    let default_name = match content_type {
        ContentType::Tracks => defaults::TRACK_NAME,
        _ => defaults::MOD_NAME,
    };

    Some(ContentItem {
        id,
        name: record.name.unwrap_or_else(|| default_name.to_string()),
        creator: record.creator.unwrap_or_else(|| defaults::CREATOR.to_string()),
        description,
        category: normalize_category(record.category.as_deref()),
        thumbnail,
        images,
        downloads: consolidate_downloads(candidates, count),
        rating: normalize_rating(record.rating),
        difficulty: record
            .difficulty
            .unwrap_or_else(|| defaults::DIFFICULTY.to_string()),
        length: record.length.unwrap_or_else(|| defaults::LENGTH.to_string()),
        premium: record.premium.unwrap_or(false),
        version: record.version,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// Normalizes track, mod and download records. Records that cannot be read
/// or lack an id are dropped, as are repeated ids.
pub fn normalize_content(records: &[Value], content_type: ContentType) -> Vec<ContentItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(records.len());

    for raw in records {
        let record: RawContentRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable {content_type} record: {e}");
                continue;
            }
        };
        let Some(item) = normalize_record(record, content_type) else {
            continue;
        };
        if !seen.insert(item.id.clone()) {
            debug!("Skipping duplicate {content_type} id {}", item.id);
            continue;
        }
        items.push(item);
    }

    debug!(
        "Normalized {} of {} {content_type} records",
        items.len(),
        records.len()
    );
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing_utils::TestDataBuilder;
    use serde_json::json;

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category(Some("motocross")), "Motocross");
        assert_eq!(normalize_category(Some(" SUPERCROSS ")), "Supercross");
        assert_eq!(normalize_category(Some("Hard Enduro ")), "Hard Enduro");
        assert_eq!(normalize_category(Some("  ")), "Uncategorized");
        assert_eq!(normalize_category(None), "Uncategorized");
    }

    #[test]
    fn test_normalize_rating_bounds() {
        assert_eq!(normalize_rating(Some(4.5)), 4.5);
        assert_eq!(normalize_rating(Some(5.0)), 5.0);
        assert_eq!(normalize_rating(Some(0.0)), 0.0);
        assert_eq!(normalize_rating(Some(7.0)), 0.0);
        assert_eq!(normalize_rating(Some(-1.0)), 0.0);
        assert_eq!(normalize_rating(None), 0.0);
    }

    #[test]
    fn test_resolve_image() {
        assert_eq!(
            resolve_image("https://cdn.mxbikes.app/a.jpg").as_deref(),
            Some("https://cdn.mxbikes.app/a.jpg")
        );
        assert_eq!(
            resolve_image("/static/img/a.jpg").as_deref(),
            Some("/static/img/a.jpg")
        );
        assert_eq!(
            resolve_image("../static/img/a.jpg").as_deref(),
            Some("/static/img/a.jpg")
        );
        assert_eq!(resolve_image("a.jpg"), None);
        assert_eq!(resolve_image("javascript:alert(1)"), None);
        assert_eq!(resolve_image("//cdn.example.com/a.jpg"), None);
    }

    #[test]
    fn test_raw_track_is_normalized() {
        let items = normalize_content(&[TestDataBuilder::raw_track("t1", "Club MX")], ContentType::Tracks);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, "t1");
        assert_eq!(item.name, "Club MX");
        assert_eq!(item.category, "Motocross");
        assert_eq!(item.rating, 4.5);
        assert_eq!(item.downloads.count, 42);
        assert_eq!(
            item.downloads.primary.as_deref(),
            Some("https://www.mediafire.com/file/xyz/track.zip")
        );
        assert_eq!(item.downloads.mirrors, vec!["https://mega.nz/file/abc"]);
        assert!(item.created_at.is_some());
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let items = normalize_content(&[json!({"id": 9})], ContentType::Mods);
        let item = &items[0];
        assert_eq!(item.id, "9");
        assert_eq!(item.name, "Unnamed Mod");
        assert_eq!(item.creator, "Unknown");
        assert_eq!(item.category, "Uncategorized");
        assert_eq!(item.thumbnail, "/static/assets/images/placeholder.jpg");
        assert_eq!(item.difficulty, "Medium");
        assert!(!item.premium);
        assert!(!item.downloads.has_links());
    }

    #[test]
    fn test_records_without_id_and_duplicates_are_dropped() {
        let items = normalize_content(
            &[
                json!({"name": "No id"}),
                json!({"id": "a", "name": "First"}),
                json!({"id": "a", "name": "Second"}),
                json!("not an object"),
            ],
            ContentType::Tracks,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "First");
    }

    #[test]
    fn test_wrong_field_types_do_not_reject_record() {
        let items = normalize_content(
            &[json!({
                "id": "x",
                "name": ["not", "a", "string"],
                "rating": "excellent",
                "images": 12,
                "premium": "yes"
            })],
            ContentType::Tracks,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Unnamed Track");
        assert_eq!(items[0].rating, 0.0);
        assert!(items[0].images.is_empty());
        assert!(items[0].premium);
    }

    #[test]
    fn test_image_set_and_additional_images() {
        let items = normalize_content(
            &[json!({
                "id": "m1",
                "images": {"cover": "/static/cover.jpg", "gallery": ["/static/g1.jpg"]},
                "additionalImages": ["/static/g2.jpg", "/static/g1.jpg"]
            })],
            ContentType::Mods,
        );
        let item = &items[0];
        assert_eq!(item.thumbnail, "/static/cover.jpg");
        assert_eq!(item.images, vec!["/static/g1.jpg", "/static/g2.jpg"]);
    }

    #[test]
    fn test_description_links_are_collected() {
        let items = normalize_content(
            &[json!({
                "id": "d1",
                "description": "Get it from https://mega.nz/file/desc now",
                "download_count": "15"
            })],
            ContentType::Downloads,
        );
        assert_eq!(
            items[0].downloads.primary.as_deref(),
            Some("https://mega.nz/file/desc")
        );
        assert_eq!(items[0].downloads.count, 15);
    }
}
