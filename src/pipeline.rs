//! One bot run: fetch, extract, compare, render, publish, persist.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::change::has_changed;
use crate::config::BotConfig;
use crate::format::PostRenderer;
use crate::normalize::normalize_key;
use crate::notify::Publisher;
use crate::scrapers::{find_probability_row, find_standings_row, PageFetcher};
use crate::storage::{short, SnapshotStore};
use crate::types::{ProbabilitySet, RenderedPost, RunOutcome, Snapshot, StandingsRecord};

/// Flags for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Render only; never publish or write the cache.
    pub preview: bool,
    /// Publish even when the data matches the last post.
    pub force: bool,
    /// Split an over-long post into a thread instead of truncating it.
    pub thread: bool,
}

pub struct Pipeline<'a> {
    config: &'a BotConfig,
    fetcher: &'a dyn PageFetcher,
    store: &'a dyn SnapshotStore,
    target_key: String,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a BotConfig, fetcher: &'a dyn PageFetcher, store: &'a dyn SnapshotStore) -> Self {
        Self {
            config,
            fetcher,
            store,
            target_key: normalize_key(config.team.name.trim()),
        }
    }

    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    /// Run once. `publisher` may be `None` in preview mode.
    pub fn run(
        &self,
        options: &RunOptions,
        today: NaiveDate,
        publisher: Option<&dyn Publisher>,
    ) -> Result<RunOutcome> {
        let snapshot = self.collect_snapshot();
        info!("Fresh snapshot {}", short(&snapshot.fingerprint()));

        let previous = self.load_previous();

        if !has_changed(&snapshot, previous.as_ref()) {
            if !options.force {
                info!("Data unchanged, nothing to post (use --force to post anyway)");
                return Ok(RunOutcome::Skipped);
            }
            info!("Data unchanged but forced, posting anyway");
        }

        let post = self.render(&snapshot, today, options.thread);
        for (i, chunk) in post.chunks.iter().enumerate() {
            info!(
                "Rendered post {}/{} ({} characters):\n{}",
                i + 1,
                post.chunks.len(),
                chunk.chars().count(),
                chunk
            );
        }

        if options.preview {
            info!("Preview mode, nothing published");
            return Ok(RunOutcome::Previewed(post));
        }

        let Some(publisher) = publisher else {
            bail!("no publisher configured");
        };

        let ids = match post.chunks.as_slice() {
            [] => bail!("rendered post is empty"),
            [single] => vec![publisher
                .publish(single)
                .with_context(|| format!("Failed to publish to {}", publisher.name()))?],
            chunks => publisher
                .publish_thread(chunks)
                .with_context(|| format!("Failed to publish thread to {}", publisher.name()))?,
        };
        info!("Published {} post(s) to {}", ids.len(), publisher.name());

        let cache_updated = match self.store.save(&snapshot) {
            Ok(()) => true,
            Err(e) if self.config.fail_on_cache_error => {
                return Err(e.context("post published but the snapshot could not be saved"));
            }
            Err(e) => {
                error!("Post published but the cache was not updated: {:#}", e);
                false
            }
        };

        Ok(RunOutcome::Published { ids, cache_updated })
    }

    /// Fetch every page; a failed page counts as absent data.
    pub fn collect_snapshot(&self) -> Snapshot {
        info!("Collecting data for {}", self.target_key);

        let standings = self.extract_standings();

        let mut probabilities = ProbabilitySet::new();
        for objective in &self.config.objectives {
            let value = match self.fetcher.fetch_document(&objective.url) {
                Ok(document) => find_probability_row(&document, &self.target_key),
                Err(e) => {
                    warn!("Skipping objective '{}': {}", objective.key, e);
                    None
                }
            };
            probabilities.insert(objective.key.clone(), value);
        }

        info!("Data collection finished");
        Snapshot {
            standings,
            probabilities,
        }
    }

    fn extract_standings(&self) -> Option<StandingsRecord> {
        match self.fetcher.fetch_document(&self.config.standings_url) {
            Ok(document) => find_standings_row(
                &document,
                &self.target_key,
                self.config.post.games_in_season,
            ),
            Err(e) => {
                warn!("Skipping standings: {}", e);
                None
            }
        }
    }

    fn load_previous(&self) -> Option<Snapshot> {
        match self.store.load() {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Could not load the previous snapshot, treating data as new: {:#}", e);
                None
            }
        }
    }

    pub fn render(&self, snapshot: &Snapshot, today: NaiveDate, thread: bool) -> RenderedPost {
        PostRenderer::new(&self.config.team, &self.config.post, &self.config.objectives)
            .render_post(snapshot, today, thread)
    }

    /// Remove the stored snapshot so the next run posts unconditionally.
    pub fn clear_cache(&self) -> Result<bool> {
        self.store.clear().context("Failed to clear the cache")
    }
}
