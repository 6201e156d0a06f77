use crate::error::ProviderError;
use crate::federated::{Category, ProviderDescriptor, RawResult, SearchFilters};
use crate::Provider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_LIMIT: usize = 10;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub query: Option<SearchBody>,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub pageid: u64,
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    pub timestamp: Option<String>,
}

/// Full-text article search against the MediaWiki API.
pub struct WikipediaProvider {
    client: Client,
    language: String,
}

impl WikipediaProvider {
    pub fn new(language: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("gather/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(WikipediaProvider {
            client,
            language: language.into(),
        })
    }

    pub fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor::new("wikipedia", "Wikipedia", Category::Academic)
    }

    fn base_url(&self) -> String {
        format!("https://{}.wikipedia.org/w/api.php", self.language)
    }

    fn article_url(&self, title: &str) -> String {
        format!(
            "https://{}.wikipedia.org/wiki/{}",
            self.language,
            title.replace(' ', "_")
        )
    }

    /// Map a search envelope to results.
    pub fn to_results(&self, envelope: SearchEnvelope) -> Result<Vec<RawResult>, ProviderError> {
        let body = envelope
            .query
            .ok_or_else(|| ProviderError::Parse("missing 'query' in response".to_string()))?;
        Ok(body
            .search
            .into_iter()
            .map(|hit| {
                let published_at = hit
                    .timestamp
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(Utc::now);
                let snippet = strip_markup(&hit.snippet);
                RawResult::new(
                    hit.pageid.to_string(),
                    hit.title.clone(),
                    self.article_url(&hit.title),
                    "Wikipedia",
                    published_at,
                )
                .with_description(snippet)
            })
            .collect())
    }
}

#[async_trait]
impl Provider for WikipediaProvider {
    async fn fetch(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RawResult>, ProviderError> {
        let limit = filters.limit.unwrap_or(DEFAULT_LIMIT).to_string();
        let params = [
            ("action", "query"),
            ("list", "search"),
            ("srprop", "snippet|timestamp"),
            ("srlimit", limit.as_str()),
            ("srsearch", query),
            ("format", "json"),
        ];

        let response = self
            .client
            .get(self.base_url())
            .query(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Upstream(format!(
                "Wikipedia search returned {}",
                response.status()
            )));
        }
        let envelope: SearchEnvelope = response.json().await?;
        self.to_results(envelope)
    }
}

fn strip_markup(snippet: &str) -> String {
    TAG_RE
        .replace_all(snippet, "")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_search_hits() {
        let provider = WikipediaProvider::new("en").unwrap();
        let envelope: SearchEnvelope = serde_json::from_str(
            r#"{"batchcomplete":"","query":{"searchinfo":{"totalhits":2},"search":[
                {"ns":0,"title":"Carbon tax","pageid":42,"snippet":"A <span class=\"searchmatch\">carbon</span> tax is a tax","timestamp":"2024-05-01T10:00:00Z"},
                {"ns":0,"title":"Emissions trading","pageid":43,"snippet":""}
            ]}}"#,
        )
        .unwrap();

        let results = provider.to_results(envelope).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "42");
        assert_eq!(results[0].url, "https://en.wikipedia.org/wiki/Carbon_tax");
        assert_eq!(results[0].description, "A carbon tax is a tax");
        assert_eq!(results[0].published_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert_eq!(results[1].source, "Wikipedia");
    }

    #[test]
    fn test_missing_query_is_parse_error() {
        let provider = WikipediaProvider::new("de").unwrap();
        let envelope: SearchEnvelope = serde_json::from_str(r#"{"error":{"code":"x"}}"#).unwrap();
        let err = provider.to_results(envelope).unwrap_err();
        assert_eq!(err.code_str(), "parse_error");
        assert_eq!(provider.base_url(), "https://de.wikipedia.org/w/api.php");
    }
}
