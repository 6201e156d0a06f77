use crate::cli::{Cli, ConfigAction, OutputFormat};
use crate::commands::{Context, Result};
use crate::output::{format_output, OutputData};
use owo_colors::OwoColorize;

pub async fn run(cli: &Cli, action: ConfigAction) -> Result<()> {
    let ctx = Context::load()?;
    match action {
        ConfigAction::Show => show_config(cli, &ctx),
        ConfigAction::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show_config(cli: &Cli, ctx: &Context) -> Result<()> {
    match cli.output {
        OutputFormat::Pretty => {
            println!();
            println!("{}", "Gather Configuration".bold().cyan());
            println!("{}", "====================".cyan());
            println!();

            let exists = ctx.config_path.exists();
            println!(
                "Config file: {}{}",
                ctx.config_path.display().to_string().dimmed(),
                if exists { "" } else { " (not found, using defaults)" }
            );
            println!(
                "Preferences: {}",
                ctx.config.preferences_path().display().to_string().dimmed()
            );
            println!(
                "Profiles:    {}",
                ctx.config.profiles_path().display().to_string().dimmed()
            );
            println!();
            println!("{}", ctx.config.to_toml()?);
        }
        _ => format_output(
            &OutputData::Config {
                path: ctx.config_path.display().to_string(),
                config: ctx.config.clone(),
            },
            &cli.output,
        )?,
    }
    Ok(())
}
