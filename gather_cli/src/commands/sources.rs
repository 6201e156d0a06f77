use crate::cli::{Cli, OutputFormat};
use crate::commands::{Context, Result};
use crate::output::{format_output, term_width, OutputData, SourceRow};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use gather_core::federated::{Category, SourceRegistry};
use gather_core::{PreferenceStore, UserPreferences};
use owo_colors::OwoColorize;
use tracing::info;

pub async fn list(cli: &Cli, category: Option<Category>) -> Result<()> {
    let ctx = Context::load()?;
    let preferences = ctx.preferences.read()?;
    let rows = source_rows(&ctx.registry, &preferences, category);

    match cli.output {
        OutputFormat::Pretty => {
            println!("{}", "Sources".bold().cyan());
            println!();

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_width(term_width() as u16)
                .set_header(vec!["Id", "Name", "Category", "Status"]);

            for row in &rows {
                let status = match (row.enabled, row.enabled_by_default) {
                    (true, _) => "enabled",
                    (false, true) => "disabled",
                    (false, false) => "disabled (opt-in)",
                };
                table.add_row(vec![
                    row.id.clone(),
                    row.name.clone(),
                    row.category.to_string(),
                    status.to_string(),
                ]);
            }

            println!("{}", table);
            println!();
            let enabled = rows.iter().filter(|r| r.enabled).count();
            println!(
                "{} of {} sources enabled. Use {} or {} to change.",
                enabled.to_string().green().bold(),
                rows.len(),
                "gather enable <id>".cyan(),
                "gather disable <id>".cyan()
            );
        }
        _ => format_output(&OutputData::Sources(rows), &cli.output)?,
    }

    Ok(())
}

pub async fn set_enabled(cli: &Cli, id: &str, enabled: bool) -> Result<()> {
    let ctx = Context::load()?;
    toggle(&ctx, id, enabled)?;

    match cli.output {
        OutputFormat::Pretty => {
            let state = if enabled {
                "enabled".green().to_string()
            } else {
                "disabled".yellow().to_string()
            };
            println!("{} {} {}", "✓".green().bold(), id.cyan(), state);
        }
        _ => format_output(
            &OutputData::SourceToggled {
                id: id.to_string(),
                enabled,
            },
            &cli.output,
        )?,
    }
    Ok(())
}

/// Persist an enable/disable choice for a registered source.
fn toggle(ctx: &Context, id: &str, enabled: bool) -> Result<()> {
    let descriptor = ctx.registry.require(id)?;
    let mut preferences = ctx.preferences.read()?;
    preferences.set(descriptor.id.clone(), enabled);
    ctx.preferences.write(&preferences)?;
    info!(source = %descriptor.id, enabled, "Updated source preference");
    Ok(())
}

fn source_rows(
    registry: &SourceRegistry,
    preferences: &UserPreferences,
    category: Option<Category>,
) -> Vec<SourceRow> {
    registry
        .all_providers()
        .into_iter()
        .filter(|d| category.map_or(true, |c| d.category == c))
        .map(|d| SourceRow {
            id: d.id.clone(),
            name: d.display_name.clone(),
            category: d.category,
            enabled: SourceRegistry::is_enabled(d, preferences),
            enabled_by_default: d.enabled_by_default,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;
    use gather_core::config::GatherConfig;

    fn context(dir: &std::path::Path) -> Context {
        let config = GatherConfig {
            preferences_path: Some(dir.join("preferences.json")),
            profiles_path: Some(dir.join("profiles.yaml")),
            ..GatherConfig::default()
        };
        Context::from_config(dir.join("config.toml"), config).unwrap()
    }

    #[test]
    fn test_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        toggle(&ctx, "marquee", false).unwrap();
        toggle(&ctx, "gossip-column", true).unwrap();

        let prefs = ctx.preferences.read().unwrap();
        assert_eq!(prefs.get("marquee"), Some(false));
        assert_eq!(prefs.get("gossip-column"), Some(true));

        let rows = source_rows(&ctx.registry, &prefs, Some(Category::Entertainment));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.id != "marquee" || !r.enabled));
        assert!(rows.iter().all(|r| r.id != "gossip-column" || r.enabled));
    }

    #[test]
    fn test_toggle_unknown_source() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        assert!(matches!(
            toggle(&ctx, "nope", false),
            Err(CommandError::Registry(_))
        ));
        assert!(!dir.path().join("preferences.json").exists());
    }
}
