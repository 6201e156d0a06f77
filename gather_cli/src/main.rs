use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

/// Default log filter for a given `-v` count. Core components log under
/// `gather.*` targets, crates under `gather_core`/`gather_cli`.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "gather=warn,gather_cli=info",
        1 => "gather=info",
        2 => "gather=debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over -v
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        None => {
            let _ = Cli::command().print_help();
            Ok(())
        }
        Some(Commands::Search {
            query,
            profile,
            category,
            limit,
            since,
        }) => {
            search::run(
                &cli,
                search::SearchArgs {
                    query,
                    profile: profile.as_deref(),
                    category: *category,
                    limit: *limit,
                    since: *since,
                },
            )
            .await
        }
        Some(Commands::Sources { category }) => sources::list(&cli, *category).await,
        Some(Commands::Enable { id }) => sources::set_enabled(&cli, id, true).await,
        Some(Commands::Disable { id }) => sources::set_enabled(&cli, id, false).await,
        Some(Commands::Profiles) => profiles::run(&cli).await,
        Some(Commands::Config { action }) => config::run(&cli, action.clone()).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
