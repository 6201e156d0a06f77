//! Lexical relevance scoring.
//!
//! The score is an additive sum of explainable features: exact phrase hits,
//! significant-word hits, keyword hits, a source credibility bonus and a
//! recency bonus. No statistics, no learned weights.

use super::RawResult;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    // Letters and digits; everything else separates words
    Regex::new(r"[\p{L}\p{N}]+").expect("valid word regex")
});

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "are", "was", "were", "has", "have",
    "had", "not", "but", "its", "into", "about", "over", "after", "what", "when", "where", "who",
    "why", "how", "will", "would", "can", "could", "should", "than", "then", "them", "they",
    "their", "there", "these", "those", "you", "your", "our", "out", "all", "any", "new", "more",
];

/// Sources that get a small fixed bonus. Compared case-insensitively.
const CREDIBLE_SOURCES: &[&str] = &[
    "reuters",
    "associated press",
    "ap news",
    "bbc news",
    "npr",
    "the guardian",
    "the new york times",
    "the washington post",
    "the wall street journal",
    "financial times",
    "bloomberg",
    "the economist",
    "pbs newshour",
    "nature",
    "science",
    "the lancet",
];

/// Feature weights. Title beats description beats body throughout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub title_phrase: f32,
    pub description_phrase: f32,
    pub content_phrase: f32,
    pub title_word: f32,
    pub description_word: f32,
    pub content_word: f32,
    pub keyword: f32,
    pub credible_source: f32,
    pub recent_day: f32,
    pub recent_month: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            title_phrase: 50.0,
            description_phrase: 30.0,
            content_phrase: 15.0,
            title_word: 10.0,
            description_word: 5.0,
            content_word: 2.0,
            keyword: 12.0,
            credible_source: 5.0,
            recent_day: 5.0,
            recent_month: 2.0,
        }
    }
}

/// Per-feature contributions to a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub phrase: f32,
    pub words: f32,
    pub keywords: f32,
    pub credibility: f32,
    pub recency: f32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f32 {
        self.phrase + self.words + self.keywords + self.credibility + self.recency
    }
}

/// Scores results against one query.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    /// Every query token, in order
    phrase: Vec<String>,
    words: Vec<String>,
    weights: ScoreWeights,
    now: DateTime<Utc>,
}

impl RelevanceScorer {
    pub fn new(query: &str, now: DateTime<Utc>) -> Self {
        Self::with_weights(query, now, ScoreWeights::default())
    }

    pub fn with_weights(query: &str, now: DateTime<Utc>, weights: ScoreWeights) -> Self {
        Self {
            phrase: tokenize(query),
            words: significant_words(query),
            weights,
            now,
        }
    }

    pub fn significant_words(&self) -> &[String] {
        &self.words
    }

    pub fn score(&self, result: &RawResult) -> f32 {
        self.explain(result).total()
    }

    pub fn explain(&self, result: &RawResult) -> ScoreBreakdown {
        let w = &self.weights;
        let title = tokenize(&result.title);
        let description = tokenize(&result.description);
        let content = tokenize(&result.content);

        let mut breakdown = ScoreBreakdown::default();

        if contains_phrase(&title, &self.phrase) {
            breakdown.phrase += w.title_phrase;
        }
        if contains_phrase(&description, &self.phrase) {
            breakdown.phrase += w.description_phrase;
        }
        if contains_phrase(&content, &self.phrase) {
            breakdown.phrase += w.content_phrase;
        }

        let title: HashSet<&str> = title.iter().map(String::as_str).collect();
        let description: HashSet<&str> = description.iter().map(String::as_str).collect();
        let content: HashSet<&str> = content.iter().map(String::as_str).collect();
        let keywords: HashSet<String> = result
            .keywords
            .iter()
            .flat_map(|k| tokenize(k))
            .collect();

        for word in &self.words {
            let word = word.as_str();
            if title.contains(word) {
                breakdown.words += w.title_word;
            }
            if description.contains(word) {
                breakdown.words += w.description_word;
            }
            if content.contains(word) {
                breakdown.words += w.content_word;
            }
            if keywords.contains(word) {
                breakdown.keywords += w.keyword;
            }
        }

        if is_credible_source(&result.source) {
            breakdown.credibility = w.credible_source;
        }

        let age = self.now.signed_duration_since(result.published_at);
        if age <= Duration::days(1) {
            breakdown.recency = w.recent_day;
        } else if age <= Duration::days(30) {
            breakdown.recency = w.recent_month;
        }

        breakdown
    }
}

/// Lower-cased word tokens of `text`, in order.
fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whether `phrase` occurs as a contiguous run of whole tokens.
fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && tokens.windows(phrase.len()).any(|window| window == phrase)
}

/// Lower-cased query words worth matching on, deduplicated, in query order.
pub fn significant_words(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query)
        .into_iter()
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

pub fn is_credible_source(source: &str) -> bool {
    let source = source.trim().to_lowercase();
    CREDIBLE_SOURCES.contains(&source.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn result(title: &str, description: &str, content: &str) -> RawResult {
        RawResult::new(
            "x",
            title,
            "https://example.com",
            "Example Wire",
            now() - Duration::days(90),
        )
        .with_description(description)
        .with_content(content)
    }

    #[test]
    fn test_significant_words() {
        assert_eq!(
            significant_words("The Climate policy of the EU, and climate"),
            vec!["climate", "policy"]
        );
        assert!(significant_words("a to of").is_empty());
        assert_eq!(significant_words("COVID-19 vaccines"), vec!["covid", "vaccines"]);
    }

    #[test]
    fn test_title_phrase_beats_single_body_word() {
        let scorer = RelevanceScorer::new("climate policy", now());
        let titled = result("Climate Policy Update", "", "");
        let body_only = result("Weekly roundup", "", "It mentioned climate once.");
        assert!(scorer.score(&titled) > scorer.score(&body_only));
    }

    #[test]
    fn test_field_precedence() {
        let scorer = RelevanceScorer::new("grid storage", now());
        let in_title = scorer.score(&result("Grid storage expands", "", ""));
        let in_description = scorer.score(&result("", "Grid storage expands", ""));
        let in_content = scorer.score(&result("", "", "Grid storage expands"));
        assert!(in_title > in_description);
        assert!(in_description > in_content);
        assert!(in_content > 0.0);
    }

    #[test]
    fn test_keywords_outweigh_body_words() {
        let scorer = RelevanceScorer::new("tariffs", now());
        let tagged = result("", "", "").with_keywords(["Tariffs", "trade"]);
        let body = result("", "", "new tariffs announced");
        let breakdown = scorer.explain(&tagged);
        assert_eq!(breakdown.keywords, ScoreWeights::default().keyword);
        assert!(scorer.score(&tagged) > scorer.explain(&body).words);

        let titled = result("Tariffs", "", "");
        assert!(breakdown.keywords > scorer.explain(&titled).words);
        let weights = ScoreWeights::default();
        assert!(weights.keyword > weights.title_word);
    }

    #[test]
    fn test_matches_whole_words_only() {
        let scorer = RelevanceScorer::new("ban", now());
        let unrelated = result("Urban bank earnings", "Suburban banking", "Bandwidth")
            .with_keywords(["banks"]);
        assert_eq!(scorer.explain(&unrelated), ScoreBreakdown::default());

        let matching = result("Import ban lifted", "", "");
        let breakdown = scorer.explain(&matching);
        assert_eq!(breakdown.phrase, ScoreWeights::default().title_phrase);
        assert_eq!(breakdown.words, ScoreWeights::default().title_word);
    }

    #[test]
    fn test_phrase_must_be_contiguous() {
        let scorer = RelevanceScorer::new("climate policy", now());
        assert_eq!(scorer.explain(&result("Climate, policy!", "", "")).phrase, 50.0);
        assert_eq!(
            scorer.explain(&result("Policy on climate", "", "")).phrase,
            0.0
        );
        assert_eq!(
            scorer.explain(&result("Climate policymakers", "", "")).phrase,
            0.0
        );
    }

    #[test]
    fn test_credibility_bonus() {
        let scorer = RelevanceScorer::new("markets", now());
        let mut credible = result("Markets rally", "", "");
        credible.source = "Reuters".to_string();
        let plain = result("Markets rally", "", "");
        assert_eq!(
            scorer.score(&credible) - scorer.score(&plain),
            ScoreWeights::default().credible_source
        );
        assert!(is_credible_source("  BBC News "));
        assert!(!is_credible_source("Some Blog"));
    }

    #[test]
    fn test_recency_bands() {
        let scorer = RelevanceScorer::new("zzz", now());
        let mut r = result("", "", "");

        r.published_at = now() - Duration::hours(3);
        assert_eq!(scorer.explain(&r).recency, 5.0);

        r.published_at = now() - Duration::days(10);
        assert_eq!(scorer.explain(&r).recency, 2.0);

        r.published_at = now() - Duration::days(45);
        assert_eq!(scorer.explain(&r).recency, 0.0);
    }

    #[test]
    fn test_no_match_scores_zero_for_old_unknown_source() {
        let scorer = RelevanceScorer::new("quantum", now());
        assert_eq!(scorer.score(&result("Football scores", "", "")), 0.0);
    }
}
