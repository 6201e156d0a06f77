use crate::error::ProviderError;
use crate::federated::{Category, ProviderDescriptor, RawResult, SearchFilters};
use crate::Provider;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use url::Url;

const SEARCH_URL: &str = "https://hn.algolia.com/api/v1/search";
const ITEM_URL: &str = "https://news.ycombinator.com/item?id=";
const DEFAULT_HITS: usize = 10;
const USER_AGENT: &str = concat!("gather/", env!("CARGO_PKG_VERSION"));

// Algolia search response, only the fields we map
#[derive(Debug, Deserialize)]
pub struct AlgoliaSearchResponse {
    #[serde(default)]
    pub hits: Vec<AlgoliaHit>,
}

#[derive(Debug, Deserialize)]
pub struct AlgoliaHit {
    #[serde(rename = "objectID")]
    pub object_id: Option<String>,
    #[serde(rename = "_tags")]
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
    pub created_at_i: Option<i64>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub story_text: Option<String>,
    pub points: Option<i64>,
    pub num_comments: Option<i64>,
}

/// Story search over the public Hacker News Algolia API.
#[derive(Clone)]
pub struct HackerNewsProvider {
    client: reqwest::Client,
}

impl Default for HackerNewsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HackerNewsProvider {
    pub fn new() -> Self {
        HackerNewsProvider {
            client: reqwest::Client::new(),
        }
    }

    pub fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor::new("hackernews", "Hacker News", Category::Technology)
    }

    fn search_url(query: &str, filters: &SearchFilters, now: DateTime<Utc>) -> String {
        let hits = filters.limit.unwrap_or(DEFAULT_HITS).to_string();
        let mut params = vec![
            ("query", query.to_string()),
            ("tags", "story".to_string()),
            ("hitsPerPage", hits),
        ];
        if let Some(range) = filters.date_range {
            let since = now.timestamp() - range.as_secs();
            params.push(("numericFilters", format!("created_at_i>{}", since)));
        }
        Url::parse_with_params(SEARCH_URL, &params)
            .map(String::from)
            .unwrap_or_else(|_| SEARCH_URL.to_string())
    }
}

#[async_trait]
impl Provider for HackerNewsProvider {
    async fn fetch(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RawResult>, ProviderError> {
        let url = Self::search_url(query, filters, Utc::now());
        let res = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(ProviderError::Upstream(format!(
                "Hacker News search returned {}",
                res.status()
            )));
        }
        let body = res.json::<AlgoliaSearchResponse>().await?;
        Ok(hits_to_results(body))
    }
}

/// Map Algolia hits to results, skipping hits without an id or title.
pub fn hits_to_results(response: AlgoliaSearchResponse) -> Vec<RawResult> {
    response
        .hits
        .into_iter()
        .filter_map(|hit| {
            let id = hit.object_id?;
            let title = hit.title.filter(|t| !t.trim().is_empty())?;
            let discussion = format!("{}{}", ITEM_URL, id);
            let published_at = hit
                .created_at_i
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
                .unwrap_or_else(Utc::now);

            let mut description = format!(
                "{} points, {} comments",
                hit.points.unwrap_or(0),
                hit.num_comments.unwrap_or(0)
            );
            if let Some(author) = &hit.author {
                description = format!("{} by {}", description, author);
            }

            let keywords: Vec<String> = hit
                .tags
                .unwrap_or_default()
                .into_iter()
                .filter(|t| !t.starts_with("author_") && !t.starts_with("story_"))
                .collect();

            let mut result = RawResult::new(
                id,
                title,
                hit.url.filter(|u| !u.is_empty()).unwrap_or(discussion),
                "Hacker News",
                published_at,
            )
            .with_description(description)
            .with_content(hit.story_text.unwrap_or_default())
            .with_keywords(keywords);
            if let Some(author) = hit.author {
                result = result.with_author(author);
            }
            Some(result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federated::DateRange;

    const FIXTURE: &str = r#"{
        "hits": [
            {
                "objectID": "39001",
                "_tags": ["story", "author_pg", "story_39001", "show_hn"],
                "author": "pg",
                "created_at_i": 1717243200,
                "title": "Show HN: A tiny search engine",
                "url": "https://example.com/tiny",
                "points": 120,
                "num_comments": 45
            },
            {
                "objectID": "39002",
                "_tags": ["story", "ask_hn"],
                "created_at_i": 1717239600,
                "title": "Ask HN: How do you cache search results?",
                "url": null,
                "story_text": "We see a lot of repeated queries."
            },
            { "objectID": "39003", "title": "" },
            { "title": "No id" }
        ],
        "nbHits": 4
    }"#;

    #[test]
    fn test_maps_hits() {
        let response: AlgoliaSearchResponse = serde_json::from_str(FIXTURE).unwrap();
        let results = hits_to_results(response);
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.id, "39001");
        assert_eq!(first.source, "Hacker News");
        assert_eq!(first.url, "https://example.com/tiny");
        assert_eq!(first.description, "120 points, 45 comments by pg");
        assert_eq!(first.author.as_deref(), Some("pg"));
        assert_eq!(first.keywords, vec!["story", "show_hn"]);
        assert_eq!(first.published_at.timestamp(), 1717243200);

        let second = &results[1];
        assert_eq!(second.url, "https://news.ycombinator.com/item?id=39002");
        assert_eq!(second.content, "We see a lot of repeated queries.");
    }

    #[test]
    fn test_search_url() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let filters = SearchFilters {
            limit: Some(5),
            date_range: Some(DateRange::Day),
            ..SearchFilters::default()
        };
        let url = HackerNewsProvider::search_url("rust async", &filters, now);
        assert!(url.starts_with("https://hn.algolia.com/api/v1/search?query=rust+async"));
        assert!(url.contains("hitsPerPage=5"));
        assert!(url.contains("numericFilters=created_at_i%3E1699913600"));
    }
}
