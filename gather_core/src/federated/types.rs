//! Core types for federated search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider category. Every provider belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    News,
    Technology,
    Academic,
    Business,
    Social,
    Sports,
    Entertainment,
    Government,
    Health,
    Local,
    International,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::News,
        Category::Technology,
        Category::Academic,
        Category::Business,
        Category::Social,
        Category::Sports,
        Category::Entertainment,
        Category::Government,
        Category::Health,
        Category::Local,
        Category::International,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::News => "news",
            Category::Technology => "technology",
            Category::Academic => "academic",
            Category::Business => "business",
            Category::Social => "social",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::Government => "government",
            Category::Health => "health",
            Category::Local => "local",
            Category::International => "international",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| {
                format!(
                    "unknown category '{}' (expected one of: {})",
                    s,
                    Category::ALL
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// Static description of a provider. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Stable identifier (e.g. "hackernews", "reuters")
    pub id: String,

    /// Human-readable name, also used as the display source of its results
    pub display_name: String,

    pub category: Category,

    #[serde(default = "default_enabled")]
    pub enabled_by_default: bool,
}

fn default_enabled() -> bool {
    true
}

impl ProviderDescriptor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            category,
            enabled_by_default: true,
        }
    }

    /// Mark the provider as opt-in.
    pub fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }
}

/// Publication window hint passed through to providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Day,
    Week,
    Month,
    Year,
}

impl DateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Day => "day",
            DateRange::Week => "week",
            DateRange::Month => "month",
            DateRange::Year => "year",
        }
    }

    /// Length of the window in seconds.
    pub fn as_secs(&self) -> i64 {
        match self {
            DateRange::Day => 86_400,
            DateRange::Week => 7 * 86_400,
            DateRange::Month => 30 * 86_400,
            DateRange::Year => 365 * 86_400,
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "24h" => Ok(DateRange::Day),
            "week" | "7d" => Ok(DateRange::Week),
            "month" | "30d" => Ok(DateRange::Month),
            "year" | "365d" => Ok(DateRange::Year),
            other => Err(format!(
                "unknown date range '{}' (expected day, week, month or year)",
                other
            )),
        }
    }
}

/// Optional request filters. Field order is the canonical serialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    /// Maximum number of results the caller wants back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl SearchFilters {
    /// Filters with free-text fields trimmed and lower-cased, for keying.
    pub fn canonical(&self) -> Self {
        Self {
            category: self.category,
            subcategory: self
                .subcategory
                .as_ref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            limit: self.limit,
            date_range: self.date_range,
        }
    }
}

/// A search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,

    #[serde(default)]
    pub filters: SearchFilters,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: SearchFilters::default(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.filters.category = Some(category);
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.filters.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.filters.limit = Some(limit);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.filters.date_range = Some(range);
        self
    }

    /// Trimmed, lower-cased text with inner whitespace collapsed.
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }
}

pub(crate) fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Federation metadata attached to each result by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederationMeta {
    /// Id of the provider that returned this result
    #[serde(default)]
    pub provider: String,

    /// Original rank within the provider's response (1-indexed)
    #[serde(default = "default_rank")]
    pub source_rank: usize,

    /// Relevance score computed by the pipeline (higher = better)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// Synthetic placeholder produced by the fallback generator
    #[serde(default)]
    pub fallback: bool,
}

fn default_rank() -> usize {
    1
}

impl Default for FederationMeta {
    fn default() -> Self {
        Self {
            provider: String::new(),
            source_rank: 1,
            score: None,
            fallback: false,
        }
    }
}

/// A document returned by a provider.
///
/// This is the unit every provider returns and every pipeline stage
/// operates on. Providers fill in the content fields; `federation` is
/// owned by the core and overwritten when the result is collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    /// Identifier, namespaced as `<provider>:<local id>` once collected
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Full body text
    #[serde(default)]
    pub content: String,

    pub url: String,

    /// Display source name (e.g. "Reuters")
    pub source: String,

    pub published_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(rename = "_federation", default)]
    pub federation: FederationMeta,
}

impl RawResult {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            content: String::new(),
            url: url.into(),
            source: source.into(),
            published_at,
            author: None,
            viewpoint: None,
            keywords: Vec::new(),
            federation: FederationMeta::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_viewpoint(mut self, viewpoint: impl Into<String>) -> Self {
        self.viewpoint = Some(viewpoint.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_fallback(&self) -> bool {
        self.federation.fallback
    }

    pub fn score(&self) -> f32 {
        self.federation.score.unwrap_or(0.0)
    }
}

/// Error from a source that failed during a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    /// Provider id that failed
    pub source: String,

    pub error: String,

    #[serde(default)]
    pub is_timeout: bool,
}

/// Complete answer to a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,

    /// Aggregation profile used
    pub profile: String,

    /// Flat, ranked, deduplicated results
    pub results: Vec<RawResult>,

    /// Served from the result cache without a fan-out
    #[serde(default)]
    pub cache_hit: bool,

    /// Fallback entries were generated to reach the result floor
    #[serde(default)]
    pub fallback_used: bool,

    /// Providers that completed successfully
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed: Vec<String>,

    /// Providers that failed or timed out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SourceError>,

    /// Whether some providers failed
    #[serde(default)]
    pub partial: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl SearchResponse {
    pub fn new(query: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            profile: profile.into(),
            results: Vec::new(),
            cache_hit: false,
            fallback_used: false,
            completed: Vec::new(),
            errors: Vec::new(),
            partial: false,
            duration_ms: None,
        }
    }

    pub fn add_error(
        &mut self,
        source: impl Into<String>,
        error: impl Into<String>,
        is_timeout: bool,
    ) {
        self.errors.push(SourceError {
            source: source.into(),
            error: error.into(),
            is_timeout,
        });
        self.partial = true;
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True when every dispatched provider failed.
    pub fn all_failed(&self) -> bool {
        self.completed.is_empty() && !self.errors.is_empty()
    }

    pub fn fallback_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_fallback()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_category_round_trip_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!(" Health ".parse::<Category>().unwrap(), Category::Health);
        assert!("politics".parse::<Category>().is_err());
    }

    #[test]
    fn test_normalized_text() {
        let query = SearchQuery::new("  Climate   POLICY\tnews ");
        assert_eq!(query.normalized_text(), "climate policy news");
    }

    #[test]
    fn test_canonical_filters() {
        let filters = SearchFilters {
            subcategory: Some("  Energy ".to_string()),
            ..Default::default()
        };
        assert_eq!(filters.canonical().subcategory.as_deref(), Some("energy"));

        let blank = SearchFilters {
            subcategory: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.canonical().subcategory, None);
    }

    #[test]
    fn test_result_builder() {
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let result = RawResult::new(
            "a1",
            "Grid upgrade approved",
            "https://example.com/a1",
            "Reuters",
            published,
        )
        .with_description("Regulators approved the plan.")
        .with_author("J. Doe")
        .with_keywords(["energy", "grid"]);

        assert_eq!(result.keywords, vec!["energy", "grid"]);
        assert_eq!(result.author.as_deref(), Some("J. Doe"));
        assert!(!result.is_fallback());
        assert_eq!(result.score(), 0.0);
    }

    #[test]
    fn test_result_serialization() {
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let result = RawResult::new("a1", "Title", "https://example.com", "NPR", published);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"_federation\""));
        assert!(json.contains("\"published_at\":\"2024-05-01T12:00:00Z\""));
        assert!(!json.contains("\"author\""));
    }

    #[test]
    fn test_response_errors() {
        let mut response = SearchResponse::new("q", "standard");
        assert!(!response.has_errors());
        response.add_error("reuters", "connection refused", false);
        assert!(response.partial);
        assert!(response.all_failed());
        response.completed.push("npr".to_string());
        assert!(!response.all_failed());
    }
}
