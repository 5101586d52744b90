//! Bot configuration: YAML file, `.env` and environment overrides.
//!
//! Every field has a default, so a missing config file gives the stock bot
//! (Vitória, Série A pages from UFMG, 280-character posts).

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const UFMG_BASE: &str = "https://www.mat.ufmg.br/futebol";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    pub team: TeamConfig,
    pub standings_url: String,
    /// Tracked objectives, in the order their lines appear in the post.
    pub objectives: Vec<ObjectiveConfig>,
    pub post: PostConfig,
    pub http: HttpConfig,
    pub cache_file: PathBuf,
    pub log: LogConfig,
    pub publisher: PublisherKind,
    /// Fail the run when the post went out but the snapshot could not be saved.
    pub fail_on_cache_error: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TeamConfig {
    /// Name as the tables spell it; folded before matching.
    pub name: String,
    /// Header text of the post.
    pub label: String,
    pub marker: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObjectiveConfig {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub marker: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostConfig {
    pub max_chars: usize,
    pub games_in_season: u32,
    pub competition: String,
    pub source: String,
    pub calendar_marker: String,
    pub standings_marker: String,
    pub goals_marker: String,
    pub unavailable_text: String,
    /// Split long posts into a thread instead of truncating.
    pub thread: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    X,
    Telegram,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            team: TeamConfig::default(),
            standings_url: format!("{UFMG_BASE}/classificacao-geral_seriea/"),
            objectives: default_objectives(),
            post: PostConfig::default(),
            http: HttpConfig::default(),
            cache_file: PathBuf::from("last_post_cache.json"),
            log: LogConfig::default(),
            publisher: PublisherKind::X,
            fail_on_cache_error: false,
        }
    }
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            name: "Vitória".to_string(),
            label: "EC VITÓRIA".to_string(),
            marker: "🔴⚫".to_string(),
        }
    }
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            max_chars: 280,
            games_in_season: 38,
            competition: "Serie A".to_string(),
            source: "UFMG".to_string(),
            calendar_marker: "📅".to_string(),
            standings_marker: "📊".to_string(),
            goals_marker: "🎯".to_string(),
            unavailable_text: "Dados indisponíveis".to_string(),
            thread: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: format!("standings_bot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file: "standings_bot.log".to_string(),
        }
    }
}

fn default_objectives() -> Vec<ObjectiveConfig> {
    let objective = |key: &str, label: &str, marker: &str, page: &str| ObjectiveConfig {
        key: key.to_string(),
        label: label.to_string(),
        marker: marker.to_string(),
        url: format!("{UFMG_BASE}/{page}/"),
    };
    vec![
        objective("rebaixamento", "Risco de Rebaixamento", "⬇🛑", "rebaixamento_seriea"),
        objective(
            "sulamericana",
            "Classificação Sula",
            "🏆",
            "classificacao-para-sulamericana_seriea",
        ),
        objective(
            "libertadores",
            "Classificação Libertadores",
            "🏆",
            "classificacao-para-libertadores_seriea",
        ),
    ]
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LogConfig {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }
}

/// Load `.env`, then the YAML file at `path` if it exists, then env overrides.
pub fn load_config(path: &Path) -> Result<BotConfig> {
    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();

    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// The YAML file alone, or defaults when it does not exist.
pub fn read_config_file(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        return Ok(BotConfig::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config YAML {:?}", path))
}

fn apply_env_overrides(config: &mut BotConfig) -> Result<()> {
    if let Ok(raw) = env::var("STANDINGS_BOT_CACHE_FILE") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.cache_file = PathBuf::from(trimmed);
        }
    }
    if let Ok(raw) = env::var("STANDINGS_BOT_PUBLISHER") {
        config.publisher = parse_publisher(&raw)?;
    }
    Ok(())
}

fn parse_publisher(raw: &str) -> Result<PublisherKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "x" | "twitter" => Ok(PublisherKind::X),
        "telegram" => Ok(PublisherKind::Telegram),
        other => anyhow::bail!("STANDINGS_BOT_PUBLISHER must be 'x' or 'telegram', got {other:?}"),
    }
}

/// Problems found in a configuration. Errors stop the bot, warnings don't.
#[derive(Debug, Default)]
pub struct ConfigReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_config(config: &BotConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    if crate::normalize::normalize_key(config.team.name.trim()).is_empty() {
        report.errors.push("team.name must contain at least one ASCII letter".into());
    }
    if config.post.max_chars < 4 {
        report.errors.push("post.max_chars must be >= 4".into());
    }
    if config.post.games_in_season == 0 {
        report.errors.push("post.games_in_season must be > 0".into());
    }
    if config.http.timeout_secs == 0 {
        report.errors.push("http.timeout_secs must be > 0".into());
    }

    check_url(&mut report, "standings_url", &config.standings_url);

    let mut seen = HashSet::new();
    for objective in &config.objectives {
        if objective.key.trim().is_empty() {
            report.errors.push("objective with empty key".into());
        } else if !seen.insert(objective.key.as_str()) {
            report.errors.push(format!("duplicate objective key '{}'", objective.key));
        }
        if objective.label.trim().is_empty() {
            report.warnings.push(format!("objective '{}' has an empty label", objective.key));
        }
        check_url(&mut report, &format!("objective '{}' url", objective.key), &objective.url);
    }

    if config.objectives.is_empty() {
        report.warnings.push("no objectives configured; posts will only show the standings".into());
    }

    report
}

fn check_url(report: &mut ConfigReport, what: &str, url: &str) {
    if url.trim().is_empty() {
        report.errors.push(format!("{what} is empty"));
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        report.warnings.push(format!("{what} has no http/https scheme: {url}"));
    }
}
