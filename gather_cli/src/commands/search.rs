use crate::cli::{Cli, OutputFormat};
use crate::commands::{CommandError, Context, Result};
use crate::output::{format_output, term_width, truncate_text, OutputData};
use gather_core::federated::{
    Category, DateRange, FederatedSearch, ResultCache, SearchQuery, SearchResponse,
};
use gather_core::PreferenceStore;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::Arc;

pub struct SearchArgs<'a> {
    pub query: &'a str,
    pub profile: Option<&'a str>,
    pub category: Option<Category>,
    pub limit: Option<usize>,
    pub since: Option<DateRange>,
}

pub async fn run(cli: &Cli, args: SearchArgs<'_>) -> Result<()> {
    if args.query.trim().is_empty() {
        return Err(CommandError::InvalidInput("query must not be empty".into()));
    }
    if args.limit == Some(0) {
        return Err(CommandError::InvalidInput("limit must be at least 1".into()));
    }

    let ctx = Context::load()?;
    let profile = ctx.resolve_profile(args.profile)?;

    let cache = Arc::new(ResultCache::new(ctx.config.cache.ttl()));
    let sweeper = cache.spawn_sweeper(ctx.config.cache.sweep_interval());
    let preferences: Arc<dyn PreferenceStore> = ctx.preferences.clone();
    let engine =
        FederatedSearch::new(ctx.registry.clone(), cache, preferences).with_profile(profile);

    let mut query = SearchQuery::new(args.query);
    if let Some(category) = args.category {
        query = query.with_category(category);
    }
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }
    if let Some(since) = args.since {
        query = query.with_date_range(since);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!(
        "Searching {} sources for '{}'...",
        engine
            .registry()
            .enabled_providers(&engine.preferences(), args.category)
            .len(),
        args.query
    ));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let response = engine.search(&query).await;

    spinner.finish_and_clear();
    sweeper.abort();

    match cli.output {
        OutputFormat::Pretty => format_pretty_results(&response),
        _ => format_output(&OutputData::Search(response), &cli.output)?,
    }
    Ok(())
}

fn format_pretty_results(response: &SearchResponse) {
    println!("{} {}", "Search:".bold().cyan(), response.query.yellow());
    println!("{} {}", "Profile:".dimmed(), response.profile.cyan());
    println!();

    let width = term_width();
    let mut header = format!("Results ({} total)", response.results.len());
    if response.cache_hit {
        header.push_str(", cached");
    }
    let line_len = width.saturating_sub(header.len() + 6).min(60);
    println!(
        "{} {} {}",
        "──".cyan(),
        header.green().bold(),
        "─".repeat(line_len).cyan()
    );
    println!();

    if response.results.is_empty() {
        println!("   {}", "No results".dimmed());
    }

    for (i, r) in response.results.iter().enumerate() {
        println!(
            " {:>3}. {} {}",
            (i + 1).to_string().cyan().bold(),
            truncate_text(&r.title, 60).bold(),
            format!("[{}]", r.source).dimmed()
        );
        println!("      {}", r.url.blue());

        let clean = r.description.replace('\n', " ").replace("  ", " ");
        let truncated = truncate_text(&clean, 100);
        if !truncated.is_empty() {
            println!("      {}", truncated.dimmed());
        }

        let published = r.published_at.format("%Y-%m-%d %H:%M").to_string();
        if r.score() > 0.0 {
            println!("      {} · score {:.0}", published.dimmed(), r.score());
        } else {
            println!("      {}", published.dimmed());
        }
        println!();
    }

    if response.fallback_used {
        println!(
            "{}",
            format!(
                "ℹ {} placeholder results added to fill out a thin result set",
                response.fallback_count()
            )
            .yellow()
        );
    }

    if response.partial && !response.errors.is_empty() {
        println!();
        println!("{}", "⚠ Partial results - some sources failed:".yellow());
        for err in &response.errors {
            let timeout_marker = if err.is_timeout { " (timeout)" } else { "" };
            println!(
                "   {} {}: {}{}",
                "•".dimmed(),
                err.source.yellow(),
                err.error.dimmed(),
                timeout_marker.dimmed()
            );
        }
    }

    println!();
    if let Some(duration) = response.duration_ms {
        println!("{}", format!("Completed in {}ms", duration).dimmed());
    }
}
