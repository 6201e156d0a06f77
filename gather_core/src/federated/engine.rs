//! Federated search execution engine.
//!
//! Coordinates the request lifecycle: cache check, fan-out to enabled
//! providers, post-processing, fallback top-up and cache write.

use super::cache::{CacheKey, ResultCache};
use super::executor::FanOutExecutor;
use super::fallback::FallbackGenerator;
use super::isolation::OutcomeStatus;
use super::pipeline::{rank, score_results, Pipeline};
use super::profiles::AggregationProfile;
use super::registry::SourceRegistry;
use super::scoring::RelevanceScorer;
use super::{RawResult, SearchQuery, SearchResponse};
use crate::preferences::{PreferenceStore, UserPreferences};
use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Engine for executing federated searches across registered providers.
///
/// Cheap to clone; clones share the registry, cache and preference store.
#[derive(Clone)]
pub struct FederatedSearch {
    registry: Arc<SourceRegistry>,
    cache: Arc<ResultCache>,
    preferences: Arc<dyn PreferenceStore>,
    profile: AggregationProfile,
}

impl FederatedSearch {
    /// Create a new engine using the `standard` profile.
    pub fn new(
        registry: Arc<SourceRegistry>,
        cache: Arc<ResultCache>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let profile = AggregationProfile::get_builtin("standard")
            .unwrap_or_else(|| AggregationProfile::new("standard"));
        Self {
            registry,
            cache,
            preferences,
            profile,
        }
    }

    pub fn with_profile(mut self, profile: AggregationProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> &AggregationProfile {
        &self.profile
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Current preferences. An unreadable store behaves like an empty one.
    pub fn preferences(&self) -> UserPreferences {
        match self.preferences.read() {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!(error = %e, "Preferences unavailable, using defaults");
                UserPreferences::default()
            }
        }
    }

    /// Ranked results for `query`. Never fails; degraded conditions show up
    /// as fewer or fallback results.
    pub async fn results(&self, query: &SearchQuery) -> Vec<RawResult> {
        self.search(query).await.results
    }

    /// Execute a federated search.
    pub async fn search(&self, query: &SearchQuery) -> SearchResponse {
        let start = Instant::now();
        let preferences = self.preferences();
        let disabled = self.registry.disabled_provider_ids(&preferences);

        let key = match CacheKey::new(query, &self.profile.name, &disabled) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(
                    target: "gather.cache",
                    error = %e,
                    "Could not build cache key; treating as a miss"
                );
                None
            }
        };

        if let Some(key) = &key {
            if let Some(results) = self.cache.get(key).await {
                let mut response = SearchResponse::new(query.text.clone(), &self.profile.name);
                response.cache_hit = true;
                response.fallback_used = results.iter().any(|r| r.is_fallback());
                response.results = results;
                return self.finish(response, start);
            }
        }

        let attempt = AssertUnwindSafe(self.search_uncached(query, &preferences))
            .catch_unwind()
            .await;

        let response = match attempt {
            Ok(response) => {
                if let Some(key) = key {
                    self.cache.set(key, response.results.clone()).await;
                }
                response
            }
            Err(_) => {
                error!(
                    query = %query.text,
                    profile = %self.profile.name,
                    "Search pipeline panicked; serving fallback results"
                );
                self.fallback_only(query)
            }
        };

        self.finish(response, start)
    }

    async fn search_uncached(
        &self,
        query: &SearchQuery,
        preferences: &UserPreferences,
    ) -> SearchResponse {
        let text = query.text.trim();
        let mut response = SearchResponse::new(query.text.clone(), &self.profile.name);

        let providers = self
            .registry
            .enabled_providers(preferences, query.filters.category);
        let executor = FanOutExecutor::new(
            self.profile.per_call_timeout(),
            self.profile.fan_out_deadline(),
        );
        let batch = executor.execute(text, &query.filters, &providers).await;

        for outcome in &batch.outcomes {
            match &outcome.status {
                OutcomeStatus::Completed { .. } => response.completed.push(outcome.provider.clone()),
                OutcomeStatus::Failed { error } => {
                    response.add_error(&outcome.provider, error, false)
                }
                OutcomeStatus::TimedOut { after_ms } => response.add_error(
                    &outcome.provider,
                    format!("timeout after {}ms", after_ms),
                    true,
                ),
            }
        }

        let enabled = self.registry.enabled_provider_ids(preferences);
        let pipeline = Pipeline::new(
            &self.registry,
            &enabled,
            self.profile.pipeline_settings(query.filters.limit),
        );
        let now = Utc::now();

        let mut output = pipeline.run(batch.results.clone(), text, now);
        if output.distinct_count < self.profile.min_results {
            let mut combined = batch.results;
            combined.extend(FallbackGenerator::new(now).generate(text, self.profile.min_results));
            output = pipeline.run(combined, text, now);
        }

        response.fallback_used = output.results.iter().any(|r| r.is_fallback());
        response.results = output.results;
        response
    }

    /// Response used when orchestration itself failed.
    fn fallback_only(&self, query: &SearchQuery) -> SearchResponse {
        let text = query.text.trim();
        let now = Utc::now();
        let generated = FallbackGenerator::new(now).generate(text, self.profile.min_results);
        let mut results = rank(score_results(generated, &RelevanceScorer::new(text, now)));
        results.truncate(self.profile.pipeline_settings(query.filters.limit).max_results);

        let mut response = SearchResponse::new(query.text.clone(), &self.profile.name);
        response.fallback_used = true;
        response.partial = true;
        response.results = results;
        response
    }

    fn finish(&self, mut response: SearchResponse, start: Instant) -> SearchResponse {
        let duration_ms = start.elapsed().as_millis() as u64;
        response.duration_ms = Some(duration_ms);
        info!(
            target: "gather.search",
            query = %response.query,
            profile = %response.profile,
            results = response.results.len(),
            cache_hit = response.cache_hit,
            fallback_used = response.fallback_used,
            failed = response.errors.len(),
            duration_ms,
            "search complete"
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::federated::{Category, ProviderDescriptor, SearchFilters};
    use crate::preferences::MemoryPreferenceStore;
    use crate::Provider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counting {
        calls: Arc<AtomicUsize>,
        titles: Vec<&'static str>,
    }

    #[async_trait]
    impl Provider for Counting {
        async fn fetch(
            &self,
            _query: &str,
            _filters: &SearchFilters,
        ) -> Result<Vec<RawResult>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .titles
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    RawResult::new(
                        i.to_string(),
                        *t,
                        format!("https://example.com/{}", i),
                        "",
                        Utc::now(),
                    )
                })
                .collect())
        }
    }

    /// A preference store whose reads always fail.
    struct Broken;

    impl PreferenceStore for Broken {
        fn read(&self) -> Result<UserPreferences, crate::error::StoreError> {
            Err(crate::error::StoreError::Unavailable("locked".into()))
        }

        fn write(&self, _: &UserPreferences) -> Result<(), crate::error::StoreError> {
            Err(crate::error::StoreError::Persist("locked".into()))
        }
    }

    fn engine_with(
        providers: Vec<(&str, Category, Vec<&'static str>)>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> (FederatedSearch, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = SourceRegistry::new();
        for (id, category, titles) in providers {
            registry
                .register(
                    ProviderDescriptor::new(id, id.to_uppercase(), category),
                    Arc::new(Counting {
                        calls: calls.clone(),
                        titles,
                    }),
                )
                .unwrap();
        }
        let cache = Arc::new(ResultCache::new(Duration::from_secs(300)));
        (
            FederatedSearch::new(Arc::new(registry), cache, preferences),
            calls,
        )
    }

    #[tokio::test]
    async fn test_second_search_is_cache_hit() {
        let (engine, calls) = engine_with(
            vec![(
                "wire",
                Category::News,
                vec!["Solar a", "Solar b", "Solar c"],
            )],
            Arc::new(MemoryPreferenceStore::new()),
        );
        let query = SearchQuery::new("solar");

        let first = engine.search(&query).await;
        let second = engine.search(&query).await;

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let ids = |r: &SearchResponse| r.results.iter().map(|x| x.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn test_results_returns_ranked_list() {
        let (engine, calls) = engine_with(
            vec![(
                "wire",
                Category::News,
                vec!["Rail strike talks", "Weather", "Rail strike ends"],
            )],
            Arc::new(MemoryPreferenceStore::new()),
        );
        let mut profile = AggregationProfile::new("exact");
        profile.per_group_cap = 3;
        profile.min_results = 0;
        let engine = engine.with_profile(profile);
        let query = SearchQuery::new("rail strike").with_limit(2);

        let results = engine.results(&query).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.title.starts_with("Rail strike")));

        let response = engine.search(&query).await;
        assert!(response.cache_hit);
        assert_eq!(response.results, results);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_preference_change_bypasses_cache() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let (engine, calls) = engine_with(
            vec![
                ("alpha", Category::News, vec!["Budget vote"]),
                ("beta", Category::Business, vec!["Budget markets"]),
            ],
            store.clone(),
        );
        let query = SearchQuery::new("budget");
        engine.search(&query).await;

        let mut prefs = store.read().unwrap();
        prefs.disable("beta");
        store.write(&prefs).unwrap();

        let response = engine.search(&query).await;
        assert!(!response.cache_hit);
        assert!(response
            .results
            .iter()
            .all(|r| r.federation.provider != "beta"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_short_results_are_topped_up() {
        let (engine, _) = engine_with(
            vec![("wire", Category::News, vec!["Rare topic"])],
            Arc::new(MemoryPreferenceStore::new()),
        );
        let response = engine.search(&SearchQuery::new("rare topic")).await;
        assert!(response.fallback_used);
        assert!(response.results.len() >= 5);
        assert!(response.results.iter().any(|r| !r.is_fallback()));
    }

    #[tokio::test]
    async fn test_broken_preference_store_uses_defaults() {
        let (engine, calls) = engine_with(
            vec![("wire", Category::News, vec!["One", "Two"])],
            Arc::new(Broken),
        );
        let response = engine.search(&SearchQuery::new("one")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.completed, vec!["wire".to_string()]);
    }

    #[tokio::test]
    async fn test_category_filter_restricts_dispatch() {
        let (engine, calls) = engine_with(
            vec![
                ("alpha", Category::News, vec!["a"]),
                ("beta", Category::Sports, vec!["b"]),
            ],
            Arc::new(MemoryPreferenceStore::new()),
        );
        let response = engine
            .search(&SearchQuery::new("x").with_category(Category::Sports))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.completed, vec!["beta".to_string()]);
    }

    #[test]
    fn test_fallback_only_response() {
        let (engine, _) = engine_with(Vec::new(), Arc::new(MemoryPreferenceStore::new()));
        let response = engine.fallback_only(&SearchQuery::new("xyz123"));
        assert!(response.fallback_used);
        assert_eq!(response.results.len(), 5);
        assert!(response.results.iter().all(|r| r.is_fallback()));
    }
}
