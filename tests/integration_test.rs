//! Integration tests for the standings bot pipeline
//! Runs whole bot cycles against fixture HTML pages, a recording publisher
//! and a cache file in a temporary directory

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;

use chrono::NaiveDate;
use scraper::Html;

use standings_bot::config::BotConfig;
use standings_bot::error::{FetchError, PublishError};
use standings_bot::notify::Publisher;
use standings_bot::pipeline::{Pipeline, RunOptions};
use standings_bot::scrapers::PageFetcher;
use standings_bot::storage::{JsonFileStore, SnapshotStore};
use standings_bot::types::{PostId, RunOutcome, Snapshot};

const EXPECTED_POST: &str = "EC VITÓRIA 🔴⚫
📅 18/10/25

📊 Serie A
Posicao: 12º
Pnts: 45
Jogos: 30/38
🎯 V: 12 | E: 9 | D: 9
SG: -8
Rendimento: 50.0%
⬇🛑 Risco de Rebaixamento
(%): 15.50%
🏆 Classificação Sula
(%): 22.30%
🏆 Classificação Libertadores: N/A

Fonte: UFMG";

/// Serves fixture pages by URL; unknown URLs answer 404.
struct FakeFetcher {
    pages: HashMap<String, String>,
}

impl FakeFetcher {
    fn for_config(config: &BotConfig) -> Self {
        let mut pages = HashMap::new();
        pages.insert(config.standings_url.clone(), fixture("standings"));
        for objective in &config.objectives {
            pages.insert(objective.url.clone(), fixture(&objective.key));
        }
        Self { pages }
    }

    fn replace(&mut self, url: &str, from: &str, to: &str) {
        let page = self.pages.get_mut(url).unwrap();
        *page = page.replace(from, to);
    }
}

impl PageFetcher for FakeFetcher {
    fn fetch_document(&self, url: &str) -> Result<Html, FetchError> {
        match self.pages.get(url) {
            Some(body) => Ok(Html::parse_document(body)),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[derive(Default)]
struct RecordingPublisher {
    /// (text, replied-to id) per accepted post.
    posts: RefCell<Vec<(String, Option<String>)>>,
    fail: bool,
}

impl RecordingPublisher {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn record(&self, text: &str, parent: Option<&PostId>) -> Result<PostId, PublishError> {
        if self.fail {
            return Err(PublishError::Api {
                service: "recording",
                status: 503,
                message: "service unavailable".into(),
            });
        }
        let mut posts = self.posts.borrow_mut();
        posts.push((text.to_string(), parent.map(|p| p.0.clone())));
        Ok(PostId(format!("post-{}", posts.len())))
    }

    fn texts(&self) -> Vec<String> {
        self.posts.borrow().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl Publisher for RecordingPublisher {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn publish(&self, text: &str) -> Result<PostId, PublishError> {
        self.record(text, None)
    }

    fn publish_reply(&self, text: &str, parent: &PostId) -> Result<PostId, PublishError> {
        self.record(text, Some(parent))
    }

    fn delete(&self, _id: &PostId) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Store whose writes always fail.
struct BrokenStore;

impl SnapshotStore for BrokenStore {
    fn load(&self) -> anyhow::Result<Option<Snapshot>> {
        Ok(None)
    }

    fn save(&self, _snapshot: &Snapshot) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }

    fn clear(&self) -> anyhow::Result<bool> {
        Ok(false)
    }
}

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}.html"))
        .unwrap_or_else(|e| panic!("missing fixture {name}: {e}"))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 18).unwrap()
}

fn publish_options() -> RunOptions {
    RunOptions::default()
}

fn url_of(config: &BotConfig, key: &str) -> String {
    config
        .objectives
        .iter()
        .find(|o| o.key == key)
        .map(|o| o.url.clone())
        .unwrap()
}

#[test]
fn test_first_run_publishes_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("last_post_cache.json"));
    let publisher = RecordingPublisher::default();

    let pipeline = Pipeline::new(&config, &fetcher, &store);
    let outcome = pipeline
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Published {
            ids: vec![PostId("post-1".into())],
            cache_updated: true,
        }
    );
    assert_eq!(publisher.texts(), vec![EXPECTED_POST.to_string()]);

    let saved = store.load().unwrap().unwrap();
    let standings = saved.standings.as_ref().unwrap();
    assert_eq!(standings.position, "12º");
    assert_eq!(standings.games, "30/38");
    assert_eq!(standings.efficiency, "50.0%");
    assert_eq!(saved.probabilities.get("rebaixamento"), Some("15,5"));
    assert_eq!(saved.probabilities.get("sulamericana"), Some("22,3"));
    assert_eq!(saved.probabilities.get("libertadores"), Some("N/A"));
}

#[test]
fn test_unchanged_second_run_skips() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::default();
    let pipeline = Pipeline::new(&config, &fetcher, &store);

    pipeline.run(&publish_options(), today(), Some(&publisher)).unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    let outcome = pipeline.run(&publish_options(), today(), Some(&publisher)).unwrap();
    assert_eq!(outcome, RunOutcome::Skipped);
    assert_eq!(publisher.posts.borrow().len(), 1);
    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
}

#[test]
fn test_changed_probability_publishes_again() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let mut fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::default();

    Pipeline::new(&config, &fetcher, &store)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap();

    fetcher.replace(&url_of(&config, "rebaixamento"), "15,5", "12,0");
    let outcome = Pipeline::new(&config, &fetcher, &store)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Published { .. }));
    let texts = publisher.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[1].contains("(%): 12.00%"));
    assert_eq!(
        store.load().unwrap().unwrap().probabilities.get("rebaixamento"),
        Some("12,0")
    );
}

#[test]
fn test_force_publishes_unchanged_data() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::default();
    let pipeline = Pipeline::new(&config, &fetcher, &store);

    pipeline.run(&publish_options(), today(), Some(&publisher)).unwrap();
    let forced = RunOptions {
        force: true,
        ..RunOptions::default()
    };
    let outcome = pipeline.run(&forced, today(), Some(&publisher)).unwrap();

    assert!(matches!(outcome, RunOutcome::Published { .. }));
    assert_eq!(publisher.posts.borrow().len(), 2);
}

#[test]
fn test_failed_objective_page_is_omitted() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let mut fetcher = FakeFetcher::for_config(&config);
    fetcher.pages.remove(&url_of(&config, "sulamericana"));
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::default();

    Pipeline::new(&config, &fetcher, &store)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap();

    let text = &publisher.texts()[0];
    assert!(!text.contains("Sula"));
    assert!(text.contains("(%): 15.50%"));
    assert!(text.contains("🏆 Classificação Libertadores: N/A"));

    let saved = store.load().unwrap().unwrap();
    assert!(saved.probabilities.contains("sulamericana"));
    assert_eq!(saved.probabilities.get("sulamericana"), None);
}

#[test]
fn test_failed_standings_page_posts_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let mut fetcher = FakeFetcher::for_config(&config);
    fetcher.pages.remove(&config.standings_url);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::default();

    let outcome = Pipeline::new(&config, &fetcher, &store)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Published { cache_updated: true, .. }));
    let text = &publisher.texts()[0];
    assert!(text.contains("\n\n📊 Dados indisponíveis\n"));
    assert!(text.contains("(%): 15.50%"));

    let saved = store.load().unwrap().unwrap();
    assert!(saved.standings.is_none());
    assert_eq!(saved.probabilities.get("rebaixamento"), Some("15,5"));
}

#[test]
fn test_team_missing_from_standings_posts_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let mut fetcher = FakeFetcher::for_config(&config);
    fetcher.replace(&config.standings_url, "Vitória", "Bahia");
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::default();

    Pipeline::new(&config, &fetcher, &store)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap();

    let text = &publisher.texts()[0];
    assert!(text.contains("\n\n📊 Dados indisponíveis\n"));
    assert!(!text.contains("Posicao"));
    assert!(store.load().unwrap().unwrap().standings.is_none());
}

#[test]
fn test_preview_never_publishes_or_persists() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let preview = RunOptions {
        preview: true,
        ..RunOptions::default()
    };

    let outcome = Pipeline::new(&config, &fetcher, &store)
        .run(&preview, today(), None)
        .unwrap();

    match outcome {
        RunOutcome::Previewed(post) => assert_eq!(post.chunks, vec![EXPECTED_POST.to_string()]),
        other => panic!("expected a preview, got {:?}", other),
    }
    assert!(!store.path().exists());
}

#[test]
fn test_publish_failure_keeps_cache_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::failing();

    let err = Pipeline::new(&config, &fetcher, &store)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap_err();

    assert!(format!("{:#}", err).contains("service unavailable"));
    assert!(!store.path().exists());
}

#[test]
fn test_publish_without_publisher_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));

    let result = Pipeline::new(&config, &fetcher, &store).run(&publish_options(), today(), None);
    assert!(result.is_err());
    assert!(!store.path().exists());
}

#[test]
fn test_corrupt_cache_counts_as_changed() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    fs::write(store.path(), "not json at all").unwrap();
    let publisher = RecordingPublisher::default();

    let outcome = Pipeline::new(&config, &fetcher, &store)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Published { cache_updated: true, .. }));
    assert!(store.load().unwrap().is_some());
}

#[test]
fn test_long_post_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BotConfig::default();
    config.post.max_chars = 100;
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::default();

    Pipeline::new(&config, &fetcher, &store)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap();

    let text = &publisher.texts()[0];
    assert_eq!(text.chars().count(), 100);
    assert!(text.ends_with("..."));
    assert!(text.starts_with("EC VITÓRIA 🔴⚫\n📅 18/10/25"));
}

#[test]
fn test_thread_mode_chains_replies() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BotConfig::default();
    config.post.max_chars = 100;
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::default();
    let thread = RunOptions {
        thread: true,
        ..RunOptions::default()
    };

    let outcome = Pipeline::new(&config, &fetcher, &store)
        .run(&thread, today(), Some(&publisher))
        .unwrap();

    let posts = publisher.posts.borrow();
    assert!(posts.len() > 1);
    assert!(posts.iter().all(|(text, _)| text.chars().count() <= 100));
    assert_eq!(posts[0].1, None);
    for (i, (_, parent)) in posts.iter().enumerate().skip(1) {
        assert_eq!(parent.as_deref(), Some(format!("post-{}", i).as_str()));
    }
    assert!(posts.last().unwrap().0.ends_with("Fonte: UFMG"));

    match outcome {
        RunOutcome::Published { ids, cache_updated } => {
            assert_eq!(ids.len(), posts.len());
            assert!(cache_updated);
        }
        other => panic!("expected a publish, got {:?}", other),
    }
}

#[test]
fn test_cache_write_failure_is_partial_success() {
    let config = BotConfig::default();
    let fetcher = FakeFetcher::for_config(&config);
    let publisher = RecordingPublisher::default();

    let outcome = Pipeline::new(&config, &fetcher, &BrokenStore)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Published {
            ids: vec![PostId("post-1".into())],
            cache_updated: false,
        }
    );
}

#[test]
fn test_cache_write_failure_fails_when_configured() {
    let mut config = BotConfig::default();
    config.fail_on_cache_error = true;
    let fetcher = FakeFetcher::for_config(&config);
    let publisher = RecordingPublisher::default();

    let err = Pipeline::new(&config, &fetcher, &BrokenStore)
        .run(&publish_options(), today(), Some(&publisher))
        .unwrap_err();

    assert!(format!("{:#}", err).contains("disk full"));
    assert_eq!(publisher.posts.borrow().len(), 1);
}

#[test]
fn test_clear_cache_forces_next_post() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::default();
    let fetcher = FakeFetcher::for_config(&config);
    let store = JsonFileStore::new(dir.path().join("cache.json"));
    let publisher = RecordingPublisher::default();
    let pipeline = Pipeline::new(&config, &fetcher, &store);

    pipeline.run(&publish_options(), today(), Some(&publisher)).unwrap();
    assert!(pipeline.clear_cache().unwrap());
    pipeline.run(&publish_options(), today(), Some(&publisher)).unwrap();

    assert_eq!(publisher.posts.borrow().len(), 2);
}
