use crate::cli::OutputFormat;
use crate::commands::Result;
use gather_core::config::GatherConfig;
use gather_core::federated::{AggregationProfile, Category, SearchResponse};
use serde::{Deserialize, Serialize};

/// One row of `gather sources`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRow {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub enabled: bool,
    pub enabled_by_default: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputData {
    Search(SearchResponse),
    Sources(Vec<SourceRow>),
    Profiles(Vec<AggregationProfile>),
    Config {
        path: String,
        config: GatherConfig,
    },
    SourceToggled {
        id: String,
        enabled: bool,
    },
}

/// Serialize `data` for the machine-readable formats.
///
/// Commands render [`OutputFormat::Pretty`] themselves; here it falls back
/// to indented JSON.
pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Pretty => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
    }
    Ok(())
}

/// Terminal width, defaulting to 80 columns.
pub fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Truncate text to max length, adding ellipsis if needed
pub fn truncate_text(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or(s);
    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
