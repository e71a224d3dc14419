use super::content::ContentItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Listing sort orders understood by the domain managers and passed upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Popular,
    Newest,
    Downloads,
    Rating,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Popular => "popular",
            SortOrder::Newest => "newest",
            SortOrder::Downloads => "downloads",
            SortOrder::Rating => "rating",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "popular" => Ok(SortOrder::Popular),
            "newest" | "new" | "recent" => Ok(SortOrder::Newest),
            "downloads" | "most_downloaded" => Ok(SortOrder::Downloads),
            "rating" | "top_rated" => Ok(SortOrder::Rating),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// Options for a single `load_data` call.
///
/// Two option sets that describe the same query produce the same
/// [`query_pairs`](LoadOptions::query_pairs), regardless of how they were
/// built, so they share a cache entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(default)]
    pub premium: bool,
    #[serde(rename = "raceId", default, skip_serializing_if = "Option::is_none")]
    pub race_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_premium(mut self, premium: bool) -> Self {
        self.premium = premium;
        self
    }

    pub fn with_race_id(mut self, race_id: impl Into<String>) -> Self {
        self.race_id = Some(race_id.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a query parameter. Keys that name a typed option (`search`/`q`,
    /// `category`, `page`, `sort`, `premium`, `raceId`/`race_id`, `id`) set
    /// that option, so local filtering sees them; values that do not parse
    /// stay as pass-through params under their own key.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.trim() {
            "search" | "q" => self.with_search(value),
            "category" => self.with_category(value),
            "page" => match value.trim().parse() {
                Ok(page) => self.with_page(page),
                Err(_) => {
                    self.extra.insert(key, value);
                    self
                }
            },
            "sort" => match value.parse() {
                Ok(sort) => self.with_sort(sort),
                Err(_) => {
                    self.extra.insert(key, value);
                    self
                }
            },
            "premium" => self.with_premium(value.trim() == "true"),
            "raceId" | "race_id" => self.with_race_id(value),
            "id" => self.with_id(value),
            _ => {
                self.extra.insert(key, value);
                self
            }
        }
    }

    /// Builds options from loose `key=value` pairs, as given on the command
    /// line. Known keys map onto typed fields; the rest become extra params.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::default(), |options, (key, value)| {
                options.with_param(key.as_ref(), value)
            })
    }

    /// Returns the canonical form: trimmed values, empty search removed and
    /// the `all` category treated as no filter.
    pub fn canonical(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            search: clean(&self.search),
            category: clean(&self.category).filter(|c| !c.eq_ignore_ascii_case("all")),
            page: self.page,
            sort: self.sort,
            premium: self.premium,
            race_id: clean(&self.race_id),
            id: clean(&self.id),
            extra: self
                .extra
                .iter()
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .filter(|(k, v)| !k.is_empty() && !v.is_empty())
                .collect(),
        }
    }

    /// Sorted query parameters of the canonical form. Used both as the
    /// upstream query string and as the option part of cache keys.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let canonical = self.canonical();
        let mut pairs: BTreeMap<String, String> = canonical.extra;

        if let Some(search) = canonical.search {
            pairs.insert("search".to_string(), search);
        }
        if let Some(category) = canonical.category {
            pairs.insert("category".to_string(), category);
        }
        if let Some(page) = canonical.page {
            pairs.insert("page".to_string(), page.to_string());
        }
        if let Some(sort) = canonical.sort {
            pairs.insert("sort".to_string(), sort.as_str().to_string());
        }
        if canonical.premium {
            pairs.insert("premium".to_string(), "true".to_string());
        }
        if let Some(race_id) = canonical.race_id {
            pairs.insert("raceId".to_string(), race_id);
        }
        if let Some(id) = canonical.id {
            pairs.insert("id".to_string(), id);
        }

        pairs.into_iter().collect()
    }

    /// Whether a catalog item passes the category and search filters
    pub fn matches_item(&self, item: &ContentItem) -> bool {
        let canonical = self.canonical();

        if let Some(category) = &canonical.category
            && !item.category.eq_ignore_ascii_case(category)
        {
            return false;
        }

        if let Some(search) = &canonical.search {
            let needle = search.to_lowercase();
            let haystacks = [&item.name, &item.description, &item.creator];
            if !haystacks
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        true
    }
}
