// src/lib.rs
pub mod config;
pub mod error;
pub mod federated;
pub mod preferences;
pub mod providers;

use crate::error::ProviderError;
use async_trait::async_trait;

pub use crate::federated::{
    Category, DateRange, FederatedSearch, ProviderDescriptor, RawResult, SearchFilters,
    SearchQuery, SearchResponse, SourceRegistry,
};
pub use crate::preferences::{PreferenceStore, UserPreferences};

/// A content source the aggregation core can fan a query out to.
///
/// Implementations may hit the network, read local data or generate canned
/// documents; the core treats all of them the same. A provider is untrusted:
/// errors, panics and hangs are contained by the isolation wrapper in
/// [`federated`], so implementations should simply return `Err` on failure.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Return zero or more documents for `query`.
    ///
    /// `query` is the caller's text, trimmed but otherwise unmodified.
    /// `filters` are hints; a provider may ignore any of them.
    async fn fetch(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RawResult>, ProviderError>;
}
