use crate::cli::{Cli, OutputFormat};
use crate::commands::{Context, Result};
use crate::output::{format_output, term_width, truncate_text, OutputData};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;

pub async fn run(cli: &Cli) -> Result<()> {
    let ctx = Context::load()?;
    let profiles = ctx.profiles.list_all();

    match cli.output {
        OutputFormat::Pretty => {
            let width = term_width();
            println!("{}", "Aggregation Profiles".bold().cyan());
            println!();

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_width(width as u16)
                .set_header(vec!["Name", "Group by", "Per group", "Max", "Min", "Description"]);

            for p in &profiles {
                let name = if p.name == ctx.config.search.default_profile {
                    format!("{} *", p.name)
                } else {
                    p.name.clone()
                };
                table.add_row(vec![
                    name,
                    p.group_by.as_str().to_string(),
                    p.per_group_cap.to_string(),
                    p.max_results.to_string(),
                    p.min_results.to_string(),
                    truncate_text(
                        p.description.as_deref().unwrap_or(""),
                        width.saturating_sub(50).max(20),
                    ),
                ]);
            }

            println!("{}", table);
            println!();
            println!(
                "{} * marks the default. User profiles live in {}",
                "Tip:".green().bold(),
                ctx.profiles.path().display().to_string().cyan()
            );
        }
        _ => format_output(&OutputData::Profiles(profiles), &cli.output)?,
    }
    Ok(())
}
