//! Standings bot: posts the team's table position and outcome chances.
//!
//! 1. Scrapes the standings page and one page per objective
//! 2. Compares with the snapshot of the last post
//! 3. Publishes when something changed (or when forced)
//! 4. Saves the new snapshot

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use standings_bot::config::{load_config, validate_config, BotConfig};
use standings_bot::logging::init_logging;
use standings_bot::notify::{publisher_from_env, Publisher};
use standings_bot::pipeline::{Pipeline, RunOptions};
use standings_bot::scrapers::HttpFetcher;
use standings_bot::storage::JsonFileStore;
use standings_bot::{PostId, RenderedPost, RunOutcome};

/// Team standings and probabilities bot
#[derive(Parser)]
#[command(name = "standings_bot", version, about = "Posts league standings and outcome probabilities")]
struct Cli {
    /// Render the post and print it without publishing or touching the cache.
    #[arg(short = 't', long = "test")]
    test: bool,

    /// Publish even if the data matches the last post.
    #[arg(short, long)]
    force: bool,

    /// Split a long post into a thread instead of truncating it.
    #[arg(long)]
    thread: bool,

    /// Remove the cached snapshot and exit.
    #[arg(long)]
    clear_cache: bool,

    /// Delete a previously published post by id and exit.
    #[arg(long, value_name = "ID")]
    delete_post: Option<String>,

    /// Path to the YAML config file.
    #[arg(long, env = "STANDINGS_BOT_CONFIG", default_value = "config.yml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.log);

    let report = validate_config(&config);
    for warning in &report.warnings {
        tracing::warn!("Config: {}", warning);
    }
    if !report.is_ok() {
        for problem in &report.errors {
            error!("Config: {}", problem);
        }
        return ExitCode::FAILURE;
    }

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &BotConfig) -> Result<()> {
    let fetcher = HttpFetcher::new(config.http.timeout(), &config.http.user_agent)?;
    let store = JsonFileStore::new(&config.cache_file);
    let pipeline = Pipeline::new(config, &fetcher, &store);

    if cli.clear_cache {
        if pipeline.clear_cache()? {
            info!("Cache cleared");
        } else {
            info!("Cache was already empty");
        }
        return Ok(());
    }

    if let Some(id) = &cli.delete_post {
        let publisher = publisher_from_env(config.publisher, config.http.timeout())?;
        publisher
            .delete(&PostId(id.clone()))
            .with_context(|| format!("Failed to delete post {} on {}", id, publisher.name()))?;
        return Ok(());
    }

    let options = RunOptions {
        preview: cli.test,
        force: cli.force,
        thread: cli.thread || config.post.thread,
    };

    let publisher: Option<Box<dyn Publisher>> = if options.preview {
        info!("=== TEST MODE: nothing will be published ===");
        None
    } else {
        Some(publisher_from_env(config.publisher, config.http.timeout())?)
    };

    let today = chrono::Local::now().date_naive();
    match pipeline.run(&options, today, publisher.as_deref())? {
        RunOutcome::Skipped => info!("No changes since the last post"),
        RunOutcome::Previewed(post) => print_preview(&post, config.post.max_chars),
        RunOutcome::Published { ids, cache_updated } => {
            let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
            info!("Published: {}", ids.join(", "));
            if !cache_updated {
                info!("Cache not updated; the next run will post again");
            }
        }
    }
    Ok(())
}

fn print_preview(post: &RenderedPost, max_chars: usize) {
    println!("\n--- PREVIEW ---");
    for (i, chunk) in post.chunks.iter().enumerate() {
        if post.is_thread() {
            println!("[{}/{}]", i + 1, post.chunks.len());
        }
        println!("{}", chunk);
        println!("({}/{} characters)\n", chunk.chars().count(), max_chars);
    }
    println!("--- END PREVIEW ---");
}
