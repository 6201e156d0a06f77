//! Synthetic results used when real sources come back short.
//!
//! Entries are generic, reference the query, and are flagged as fallback so
//! consumers can tell them apart. Each entry carries its own desk label, so
//! the diversity cap and deduplication treat them as distinct sources.

use super::types::normalize_text;
use super::{FederationMeta, RawResult};
use chrono::{DateTime, Duration, Utc};
use url::Url;

/// Provider id attached to every fallback entry.
pub const FALLBACK_PROVIDER: &str = "gather-fallback";

/// Prefix of every fallback source label.
pub const FALLBACK_SOURCE_PREFIX: &str = "Gather Fallback";

const SEARCH_BASE: &str = "https://duckduckgo.com/";

/// Coarse topic detected from query keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Technology,
    Business,
    Health,
    Politics,
    Environment,
    Sports,
    Entertainment,
    General,
}

impl Topic {
    const DETECTABLE: [Topic; 7] = [
        Topic::Technology,
        Topic::Business,
        Topic::Health,
        Topic::Politics,
        Topic::Environment,
        Topic::Sports,
        Topic::Entertainment,
    ];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Topic::Technology => &[
                "tech", "software", "ai", "computer", "chip", "app", "internet", "cyber",
                "robot", "startup", "code", "data",
            ],
            Topic::Business => &[
                "market", "stock", "economy", "business", "trade", "bank", "finance",
                "inflation", "earnings", "company", "tariff",
            ],
            Topic::Health => &[
                "health", "covid", "vaccine", "medical", "disease", "hospital", "cancer",
                "virus", "drug", "mental",
            ],
            Topic::Politics => &[
                "election", "policy", "government", "senate", "congress", "president",
                "vote", "law", "parliament", "minister",
            ],
            Topic::Environment => &[
                "climate", "environment", "emissions", "carbon", "energy", "renewable",
                "pollution", "wildlife", "weather", "solar",
            ],
            Topic::Sports => &[
                "sport", "football", "soccer", "basketball", "baseball", "tennis", "olympic",
                "league", "cup", "match",
            ],
            Topic::Entertainment => &[
                "movie", "film", "music", "celebrity", "tv", "show", "album", "actor",
                "festival", "series",
            ],
            Topic::General => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Technology => "technology",
            Topic::Business => "business",
            Topic::Health => "health",
            Topic::Politics => "politics",
            Topic::Environment => "environment",
            Topic::Sports => "sports",
            Topic::Entertainment => "entertainment",
            Topic::General => "general",
        }
    }

    fn voices(&self) -> &'static str {
        match self {
            Topic::Technology => "engineers and industry analysts",
            Topic::Business => "economists and market watchers",
            Topic::Health => "clinicians and public health experts",
            Topic::Politics => "lawmakers and policy analysts",
            Topic::Environment => "scientists and environmental groups",
            Topic::Sports => "coaches, players and commentators",
            Topic::Entertainment => "critics and audiences",
            Topic::General => "observers across the spectrum",
        }
    }

    /// First topic with a keyword among the query's words.
    pub fn detect(query: &str) -> Topic {
        let normalized = normalize_text(query);
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        Topic::DETECTABLE
            .iter()
            .copied()
            .find(|topic| {
                topic
                    .keywords()
                    .iter()
                    .any(|k| words.iter().any(|w| keyword_matches(w, k)))
            })
            .unwrap_or(Topic::General)
    }
}

/// Short keywords must match whole words; longer ones also match inflections.
fn keyword_matches(word: &str, keyword: &str) -> bool {
    word == keyword || (keyword.len() >= 4 && word.starts_with(keyword))
}

struct Template {
    desk: &'static str,
    title: &'static str,
    description: &'static str,
}

const TEMPLATES: &[Template] = &[
    Template {
        desk: "Overview",
        title: "{q}: What We Know So Far",
        description: "A general overview of {q} drawn from ongoing {topic} coverage.",
    },
    Template {
        desk: "Background",
        title: "Background and Context on {q}",
        description: "How {q} developed and where it fits in the wider {topic} picture.",
    },
    Template {
        desk: "Analysis",
        title: "Analysis: Why {q} Matters",
        description: "What {voices} are saying about the significance of {q}.",
    },
    Template {
        desk: "Explainer",
        title: "Explainer: Key Questions About {q}",
        description: "Answers to the most common questions readers ask about {q}.",
    },
    Template {
        desk: "Outlook",
        title: "What to Watch Next on {q}",
        description: "Upcoming developments in {topic} that could shape {q}.",
    },
    Template {
        desk: "Perspectives",
        title: "Different Perspectives on {q}",
        description: "A range of viewpoints from {voices} on {q}.",
    },
];

/// Builds fallback entries for a query.
#[derive(Debug, Clone, Copy)]
pub struct FallbackGenerator {
    now: DateTime<Utc>,
}

impl FallbackGenerator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// `count` flagged entries referencing `query`.
    pub fn generate(&self, query: &str, count: usize) -> Vec<RawResult> {
        let subject = query.split_whitespace().collect::<Vec<_>>().join(" ");
        let subject = if subject.is_empty() {
            "this topic".to_string()
        } else {
            subject
        };
        let topic = Topic::detect(&subject);
        let link = search_link(&subject);

        (0..count)
            .map(|i| {
                let template = &TEMPLATES[i % TEMPLATES.len()];
                let round = i / TEMPLATES.len();
                let desk = if round == 0 {
                    template.desk.to_string()
                } else {
                    format!("{} {}", template.desk, round + 1)
                };
                let fill = |s: &str| {
                    s.replace("{q}", &subject)
                        .replace("{topic}", topic.as_str())
                        .replace("{voices}", topic.voices())
                };

                let mut result = RawResult::new(
                    format!("{}:{}", FALLBACK_PROVIDER, i + 1),
                    fill(template.title),
                    link.clone(),
                    format!("{} · {}", FALLBACK_SOURCE_PREFIX, desk),
                    self.now - Duration::minutes(i as i64),
                )
                .with_description(fill(template.description))
                .with_content(format!(
                    "Live sources returned little on {} at the time of this search. \
                     This placeholder summarizes where {} coverage usually picks the story up.",
                    subject,
                    topic.as_str()
                ))
                .with_keywords([topic.as_str(), "fallback"]);
                result.federation = FederationMeta {
                    provider: FALLBACK_PROVIDER.to_string(),
                    source_rank: i + 1,
                    score: None,
                    fallback: true,
                };
                result
            })
            .collect()
    }
}

fn search_link(subject: &str) -> String {
    Url::parse_with_params(SEARCH_BASE, &[("q", subject)])
        .map(String::from)
        .unwrap_or_else(|_| SEARCH_BASE.to_string())
}
