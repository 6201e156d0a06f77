//! Offline desks that write canned coverage for any query.
//!
//! Each desk has a category, an editorial viewpoint and a few story angles.
//! Output depends only on the query, the filters and the clock, which makes
//! these providers usable without network access.

use crate::error::ProviderError;
use crate::federated::{significant_words, Category, RawResult, SearchFilters};
use crate::Provider;
use async_trait::async_trait;
use chrono::{Duration, Utc};

/// Static description of a template desk.
#[derive(Debug, Clone, Copy)]
pub struct Desk {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub viewpoint: &'static str,
    pub enabled_by_default: bool,
}

struct Angle {
    title: &'static str,
    description: &'static str,
    /// Hours before now
    age_hours: i64,
}

fn angles(category: Category) -> [Angle; 3] {
    let (a, b, c) = match category {
        Category::News => (
            "Latest developments on {q}",
            "{q}: what officials are saying",
            "Timeline: how {q} unfolded",
        ),
        Category::Technology => (
            "{q} and the engineers behind it",
            "What {q} means for developers",
            "Hands-on: first look at {q}",
        ),
        Category::Academic => (
            "New study examines {q}",
            "A literature review of {q}",
            "Researchers debate the evidence on {q}",
        ),
        Category::Business => (
            "Markets react to {q}",
            "{q}: winners and losers",
            "How {q} could affect earnings",
        ),
        Category::Social => (
            "People are talking about {q}",
            "Thread: first-hand accounts of {q}",
            "Community questions about {q}",
        ),
        Category::Sports => (
            "{q}: match report",
            "Coaches weigh in on {q}",
            "Numbers behind {q}",
        ),
        Category::Entertainment => (
            "Review: {q}",
            "Behind the scenes of {q}",
            "Audiences split over {q}",
        ),
        Category::Government => (
            "Lawmakers consider {q}",
            "Agency guidance on {q}",
            "Public hearing set on {q}",
        ),
        Category::Health => (
            "Doctors explain {q}",
            "{q}: what patients should know",
            "Public health officials track {q}",
        ),
        Category::Local => (
            "Residents respond to {q}",
            "{q} comes to city council",
            "Neighborhood groups organize around {q}",
        ),
        Category::International => (
            "{q} seen from abroad",
            "Allies and rivals respond to {q}",
            "{q}: a global roundup",
        ),
    };
    [
        Angle {
            title: a,
            description: "{desk} coverage of {q}, with the context readers need.",
            age_hours: 2,
        },
        Angle {
            title: b,
            description: "Reactions and analysis on {q} from the {desk} team.",
            age_hours: 30,
        },
        Angle {
            title: c,
            description: "A longer look at {q} and where it goes from here.",
            age_hours: 24 * 9,
        },
    ]
}

pub struct TemplateProvider {
    desk: Desk,
}

impl TemplateProvider {
    pub fn new(desk: Desk) -> Self {
        Self { desk }
    }

    fn write(&self, query: &str, filters: &SearchFilters) -> Vec<RawResult> {
        let now = Utc::now();
        let subject = query.split_whitespace().collect::<Vec<_>>().join(" ");
        if subject.is_empty() {
            return Vec::new();
        }
        let mut keywords = vec![self.desk.category.as_str().to_string()];
        keywords.extend(significant_words(&subject));

        let fill = |s: &str| s.replace("{q}", &subject).replace("{desk}", self.desk.name);
        let max_age = filters.date_range.map(|r| Duration::seconds(r.as_secs()));

        angles(self.desk.category)
            .iter()
            .enumerate()
            .filter(|(_, angle)| {
                max_age.map_or(true, |max| Duration::hours(angle.age_hours) <= max)
            })
            .take(filters.limit.unwrap_or(usize::MAX))
            .map(|(i, angle)| {
                let slug = subject.to_lowercase().replace(' ', "-");
                RawResult::new(
                    format!("{}-{}", slug, i + 1),
                    fill(angle.title),
                    format!("https://{}.example/{}/{}", self.desk.id, slug, i + 1),
                    self.desk.name,
                    now - Duration::hours(angle.age_hours),
                )
                .with_description(fill(angle.description))
                .with_content(format!(
                    "{} reports on {}. This {} desk story covers the background, the people \
                     involved and what to expect next.",
                    self.desk.name,
                    subject,
                    self.desk.category
                ))
                .with_viewpoint(self.desk.viewpoint)
                .with_keywords(keywords.clone())
            })
            .collect()
    }
}

#[async_trait]
impl Provider for TemplateProvider {
    async fn fetch(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RawResult>, ProviderError> {
        Ok(self.write(query, filters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federated::DateRange;

    fn desk() -> TemplateProvider {
        TemplateProvider::new(Desk {
            id: "market-ledger",
            name: "Market Ledger",
            category: Category::Business,
            viewpoint: "center-right",
            enabled_by_default: true,
        })
    }

    #[tokio::test]
    async fn test_writes_three_angles() {
        let results = desk()
            .fetch("Solar  tariffs", &SearchFilters::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Markets react to Solar tariffs");
        assert_eq!(results[0].source, "Market Ledger");
        assert_eq!(results[0].viewpoint.as_deref(), Some("center-right"));
        assert_eq!(results[0].keywords, vec!["business", "solar", "tariffs"]);
        assert_eq!(results[2].url, "https://market-ledger.example/solar-tariffs/3");
    }

    #[tokio::test]
    async fn test_honors_limit_and_date_range() {
        let limited = SearchFilters {
            limit: Some(1),
            ..SearchFilters::default()
        };
        assert_eq!(desk().fetch("rates", &limited).await.unwrap().len(), 1);

        let recent = SearchFilters {
            date_range: Some(DateRange::Day),
            ..SearchFilters::default()
        };
        assert_eq!(desk().fetch("rates", &recent).await.unwrap().len(), 1);

        let week = SearchFilters {
            date_range: Some(DateRange::Week),
            ..SearchFilters::default()
        };
        assert_eq!(desk().fetch("rates", &week).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_query_yields_nothing() {
        assert!(desk()
            .fetch("   ", &SearchFilters::default())
            .await
            .unwrap()
            .is_empty());
    }
}
