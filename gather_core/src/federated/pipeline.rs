//! Post-processing of fanned-out results.
//!
//! Stages, in order: deduplicate, re-filter by enablement, diversity cap,
//! relevance scoring, sort and truncate. Every stage is a pure function over
//! the result list.

use super::registry::SourceRegistry;
use super::scoring::RelevanceScorer;
use super::types::normalize_text;
use super::RawResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// What the diversity cap groups results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// One group per display source
    #[default]
    Source,
    /// One group per provider category (cross-domain "mega" aggregation)
    Category,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Source => "source",
            GroupBy::Category => "category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub group_by: GroupBy,
    pub per_group_cap: usize,
    pub max_results: usize,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Ranked and truncated results
    pub results: Vec<RawResult>,

    /// Distinct results that survived diversity, before truncation
    pub distinct_count: usize,
}

pub struct Pipeline<'a> {
    registry: &'a SourceRegistry,
    enabled: &'a BTreeSet<String>,
    settings: PipelineSettings,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        registry: &'a SourceRegistry,
        enabled: &'a BTreeSet<String>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            enabled,
            settings,
        }
    }

    pub fn run(&self, raw: Vec<RawResult>, query: &str, now: DateTime<Utc>) -> PipelineOutput {
        let received = raw.len();
        let deduped = deduplicate(raw);
        let deduped_len = deduped.len();
        let filtered = refilter_enabled(deduped, self.registry, self.enabled);
        let filtered_len = filtered.len();
        let diverse = diversify(
            filtered,
            self.settings.group_by,
            self.settings.per_group_cap,
            self.registry,
        );
        let distinct_count = diverse.len();

        let scorer = RelevanceScorer::new(query, now);
        let mut ranked = rank(score_results(diverse, &scorer));
        ranked.truncate(self.settings.max_results);

        debug!(
            target: "gather.pipeline",
            received,
            deduped = deduped_len,
            filtered = filtered_len,
            distinct = distinct_count,
            returned = ranked.len(),
            "pipeline finished"
        );

        PipelineOutput {
            results: ranked,
            distinct_count,
        }
    }
}

fn dedup_key(result: &RawResult) -> (String, String) {
    (normalize_text(&result.title), normalize_text(&result.source))
}

/// Drop later results with the same (title, source); first occurrence wins.
pub fn deduplicate(results: Vec<RawResult>) -> Vec<RawResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(dedup_key(r)))
        .collect()
}

/// Drop results attributable to a disabled provider.
///
/// Attribution uses the provider id stamped at collection time, falling back
/// to the display-name mapping for results whose id is not registered.
/// Results that map to no registered provider (fallback entries) are kept.
pub fn refilter_enabled(
    results: Vec<RawResult>,
    registry: &SourceRegistry,
    enabled: &BTreeSet<String>,
) -> Vec<RawResult> {
    results
        .into_iter()
        .filter(|r| {
            let owner = if registry.get(&r.federation.provider).is_some() {
                Some(r.federation.provider.as_str())
            } else {
                registry.provider_id_for_source(&r.source)
            };
            match owner {
                Some(id) => enabled.contains(id),
                None => true,
            }
        })
        .collect()
}

fn group_key(result: &RawResult, group_by: GroupBy, registry: &SourceRegistry) -> String {
    let source_key = || format!("source:{}", normalize_text(&result.source));
    match group_by {
        GroupBy::Source => source_key(),
        GroupBy::Category => registry
            .category_of(&result.federation.provider)
            .map(|c| format!("category:{}", c))
            .unwrap_or_else(source_key),
    }
}

/// Keep at most `cap` results per group, then merge the groups back in order
/// of each group's first appearance.
pub fn diversify(
    results: Vec<RawResult>,
    group_by: GroupBy,
    cap: usize,
    registry: &SourceRegistry,
) -> Vec<RawResult> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<RawResult>> = HashMap::new();

    for result in results {
        let key = group_key(&result, group_by, registry);
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        if group.len() < cap {
            group.push(result);
        }
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .flatten()
        .collect()
}

pub fn score_results(results: Vec<RawResult>, scorer: &RelevanceScorer) -> Vec<RawResult> {
    results
        .into_iter()
        .map(|mut r| {
            r.federation.score = Some(scorer.score(&r));
            r
        })
        .collect()
}

/// Sort by score (descending), then newer first. The sort is stable, so
/// remaining ties keep pipeline order.
pub fn rank(mut results: Vec<RawResult>) -> Vec<RawResult> {
    results.sort_by(compare_ranked);
    results
}

fn compare_ranked(a: &RawResult, b: &RawResult) -> Ordering {
    b.score()
        .partial_cmp(&a.score())
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.published_at.cmp(&a.published_at))
}
