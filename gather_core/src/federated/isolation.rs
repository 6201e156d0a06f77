//! Isolation boundary around a single provider call.
//!
//! Whatever a provider does (returns an error, panics, or never finishes),
//! the caller gets back a value: the provider's results on success, an
//! empty list otherwise, and an outcome record saying which happened.

use super::registry::RegisteredProvider;
use super::{FederationMeta, RawResult, SearchFilters};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// How a single provider call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed { count: usize },
    Failed { error: String },
    TimedOut { after_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    pub duration_ms: u64,
}

impl ProviderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Completed { .. })
    }
}

/// Results of one isolated call, always present (possibly empty).
#[derive(Debug, Clone)]
pub struct IsolatedFetch {
    pub outcome: ProviderOutcome,
    pub results: Vec<RawResult>,
}

/// Call `entry`'s provider, containing every failure mode.
///
/// The call is bounded by `per_call` and by the shared fan-out `deadline`,
/// whichever comes first.
pub async fn fetch_isolated(
    entry: &RegisteredProvider,
    query: &str,
    filters: &SearchFilters,
    per_call: Duration,
    deadline: Instant,
) -> IsolatedFetch {
    let provider_id = entry.descriptor.id.as_str();
    let start = Instant::now();
    let limit = (start + per_call).min(deadline);

    let call = AssertUnwindSafe(entry.provider.fetch(query, filters)).catch_unwind();
    let settled = timeout_at(limit, call).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let (status, results) = match settled {
        Ok(Ok(Ok(raw))) => {
            let results = stamp_results(entry, raw);
            debug!(
                target: "gather.fanout",
                provider = provider_id,
                count = results.len(),
                duration_ms,
                "provider completed"
            );
            (
                OutcomeStatus::Completed {
                    count: results.len(),
                },
                results,
            )
        }
        Ok(Ok(Err(err))) => {
            warn!(
                target: "gather.fanout",
                provider = provider_id,
                code = err.code_str(),
                error = %err,
                "provider failed; contributing no results"
            );
            (
                OutcomeStatus::Failed {
                    error: err.to_string(),
                },
                Vec::new(),
            )
        }
        Ok(Err(payload)) => {
            let reason = panic_reason(payload.as_ref());
            warn!(
                target: "gather.fanout",
                provider = provider_id,
                reason = %reason,
                "provider panicked; contributing no results"
            );
            (
                OutcomeStatus::Failed {
                    error: format!("provider panicked: {}", reason),
                },
                Vec::new(),
            )
        }
        Err(_) => {
            warn!(
                target: "gather.fanout",
                provider = provider_id,
                after_ms = duration_ms,
                "provider timed out; contributing no results"
            );
            (
                OutcomeStatus::TimedOut {
                    after_ms: duration_ms,
                },
                Vec::new(),
            )
        }
    };

    IsolatedFetch {
        outcome: ProviderOutcome {
            provider: provider_id.to_string(),
            status,
            duration_ms,
        },
        results,
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Namespace ids and attach federation metadata.
fn stamp_results(entry: &RegisteredProvider, raw: Vec<RawResult>) -> Vec<RawResult> {
    let provider_id = &entry.descriptor.id;
    let prefix = format!("{}:", provider_id);
    raw.into_iter()
        .enumerate()
        .map(|(idx, mut result)| {
            if !result.id.starts_with(&prefix) {
                result.id = format!("{}{}", prefix, result.id);
            }
            if result.source.trim().is_empty() {
                result.source = entry.descriptor.display_name.clone();
            }
            result.federation = FederationMeta {
                provider: provider_id.clone(),
                source_rank: idx + 1,
                score: None,
                fallback: false,
            };
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::federated::{Category, ProviderDescriptor};
    use crate::Provider;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;

    enum Behavior {
        Ok(usize),
        Fail,
        Panic,
        Hang,
    }

    struct Scripted(Behavior);

    #[async_trait]
    impl Provider for Scripted {
        async fn fetch(
            &self,
            query: &str,
            _filters: &SearchFilters,
        ) -> Result<Vec<RawResult>, ProviderError> {
            match self.0 {
                Behavior::Ok(n) => Ok((0..n)
                    .map(|i| {
                        RawResult::new(
                            format!("{}", i),
                            format!("{} story {}", query, i),
                            format!("https://example.com/{}", i),
                            "",
                            Utc::now(),
                        )
                    })
                    .collect()),
                Behavior::Fail => Err(ProviderError::Upstream("503 Service Unavailable".into())),
                Behavior::Panic => panic!("template index out of range"),
                Behavior::Hang => futures::future::pending().await,
            }
        }
    }

    fn entry(behavior: Behavior) -> RegisteredProvider {
        RegisteredProvider {
            descriptor: ProviderDescriptor::new("wire", "Wire Service", Category::News),
            provider: Arc::new(Scripted(behavior)),
        }
    }

    async fn run(behavior: Behavior) -> IsolatedFetch {
        let per_call = Duration::from_secs(5);
        fetch_isolated(
            &entry(behavior),
            "solar",
            &SearchFilters::default(),
            per_call,
            Instant::now() + Duration::from_secs(60),
        )
        .await
    }

    #[tokio::test]
    async fn test_success_stamps_metadata() {
        let fetched = run(Behavior::Ok(2)).await;
        assert!(fetched.outcome.is_success());
        assert_eq!(fetched.outcome.status, OutcomeStatus::Completed { count: 2 });
        assert_eq!(fetched.results[0].id, "wire:0");
        assert_eq!(fetched.results[1].federation.source_rank, 2);
        assert_eq!(fetched.results[0].federation.provider, "wire");
        assert_eq!(fetched.results[0].source, "Wire Service");
    }

    #[tokio::test]
    async fn test_error_becomes_empty() {
        let fetched = run(Behavior::Fail).await;
        assert!(fetched.results.is_empty());
        assert!(matches!(
            fetched.outcome.status,
            OutcomeStatus::Failed { ref error } if error.contains("503")
        ));
    }

    #[tokio::test]
    async fn test_panic_becomes_empty() {
        let fetched = run(Behavior::Panic).await;
        assert!(fetched.results.is_empty());
        assert!(matches!(
            fetched.outcome.status,
            OutcomeStatus::Failed { ref error } if error.contains("template index out of range")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_times_out() {
        let fetched = run(Behavior::Hang).await;
        assert!(fetched.results.is_empty());
        assert!(matches!(
            fetched.outcome.status,
            OutcomeStatus::TimedOut { after_ms } if after_ms >= 5000
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_caps_per_call_timeout() {
        let fetched = fetch_isolated(
            &entry(Behavior::Hang),
            "solar",
            &SearchFilters::default(),
            Duration::from_secs(30),
            Instant::now() + Duration::from_secs(2),
        )
        .await;
        assert!(matches!(
            fetched.outcome.status,
            OutcomeStatus::TimedOut { after_ms } if (2000..30_000).contains(&after_ms)
        ));
    }

    #[test]
    fn test_already_namespaced_ids_are_kept() {
        let e = entry(Behavior::Ok(0));
        let stamped = stamp_results(
            &e,
            vec![RawResult::new(
                "wire:abc",
                "t",
                "https://example.com",
                "Wire Service",
                Utc::now(),
            )],
        );
        assert_eq!(stamped[0].id, "wire:abc");
    }
}
