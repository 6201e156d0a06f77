//! Concurrent fan-out of one query to many providers.

use super::isolation::{fetch_isolated, ProviderOutcome};
use super::registry::RegisteredProvider;
use super::{RawResult, SearchFilters};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Everything collected from one fan-out.
#[derive(Debug, Clone, Default)]
pub struct FanOutBatch {
    /// Results of all successful calls, concatenated in registration order
    pub results: Vec<RawResult>,

    /// One outcome per dispatched provider, in registration order
    pub outcomes: Vec<ProviderOutcome>,
}

impl FanOutBatch {
    pub fn succeeded(&self) -> impl Iterator<Item = &ProviderOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProviderOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Settle-all executor: every call runs to a terminal state (results, error,
/// or timeout) before the batch is returned. One slow provider is bounded by
/// the timeouts; one failing provider never poisons the rest.
#[derive(Debug, Clone, Copy)]
pub struct FanOutExecutor {
    per_call_timeout: Duration,
    deadline: Duration,
}

impl FanOutExecutor {
    pub fn new(per_call_timeout: Duration, deadline: Duration) -> Self {
        Self {
            per_call_timeout,
            deadline,
        }
    }

    pub async fn execute(
        &self,
        query: &str,
        filters: &SearchFilters,
        providers: &[&RegisteredProvider],
    ) -> FanOutBatch {
        let start = Instant::now();
        let deadline = start + self.deadline;

        let futures: Vec<_> = providers
            .iter()
            .map(|entry| fetch_isolated(entry, query, filters, self.per_call_timeout, deadline))
            .collect();

        // join_all keeps input order regardless of completion order
        let settled = futures::future::join_all(futures).await;

        let mut batch = FanOutBatch::default();
        for fetched in settled {
            batch.results.extend(fetched.results);
            batch.outcomes.push(fetched.outcome);
        }

        debug!(
            target: "gather.fanout",
            providers = providers.len(),
            succeeded = batch.succeeded().count(),
            results = batch.results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "fan-out settled"
        );
        batch
    }
}
