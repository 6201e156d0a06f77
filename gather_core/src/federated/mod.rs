//! Federated search across registered providers.
//!
//! This module provides:
//! - `SourceRegistry`: the catalog of providers and their enablement
//! - `ResultCache`: TTL cache of ranked result lists
//! - `FanOutExecutor`: settle-all concurrent dispatch with isolation
//! - `Pipeline`: dedup, re-filter, diversity cap, scoring and ranking
//! - `FederatedSearch`: the engine tying these together
//!
//! # Example
//!
//! ```ignore
//! use gather_core::federated::{FederatedSearch, ResultCache, SearchQuery};
//!
//! let engine = FederatedSearch::new(registry, cache, preferences);
//! let response = engine.search(&SearchQuery::new("climate policy")).await;
//! ```

mod cache;
mod engine;
mod executor;
mod fallback;
mod isolation;
mod pipeline;
mod profiles;
mod registry;
mod scoring;
mod types;

pub use cache::{CacheKey, CacheStats, ResultCache};
pub use engine::FederatedSearch;
pub use executor::{FanOutBatch, FanOutExecutor};
pub use fallback::{FallbackGenerator, Topic, FALLBACK_PROVIDER, FALLBACK_SOURCE_PREFIX};
pub use isolation::{fetch_isolated, IsolatedFetch, OutcomeStatus, ProviderOutcome};
pub use pipeline::{
    deduplicate, diversify, rank, refilter_enabled, score_results, GroupBy, Pipeline,
    PipelineOutput, PipelineSettings,
};
pub use profiles::{
    AggregationProfile, ProfileStore, ProfileStoreError, DEFAULT_GLOBAL_TIMEOUT_MS,
    DEFAULT_MAX_RESULTS, DEFAULT_MIN_RESULTS, DEFAULT_PER_GROUP_CAP, DEFAULT_TIMEOUT_MS,
};
pub use registry::{RegisteredProvider, SourceRegistry};
pub use scoring::{is_credible_source, significant_words, RelevanceScorer, ScoreBreakdown, ScoreWeights};
pub use types::{
    Category, DateRange, FederationMeta, ProviderDescriptor, RawResult, SearchFilters,
    SearchQuery, SearchResponse, SourceError,
};
