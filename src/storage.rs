use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Snapshot;

/// Where the last published snapshot lives between runs.
pub trait SnapshotStore {
    /// `Ok(None)` when nothing was saved yet.
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
    /// Remove the saved snapshot. `Ok(false)` when there was none.
    fn clear(&self) -> Result<bool>;
}

/// On-disk form: the snapshot plus bookkeeping that is never compared.
#[derive(Debug, Deserialize, Serialize)]
struct CacheFile {
    #[serde(flatten)]
    snapshot: Snapshot,
    saved_at: DateTime<Utc>,
    fingerprint: String,
}

/// Snapshot kept as a pretty-printed JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            info!("No cache file at {:?} yet", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cache from {:?}", self.path))?;
        let cache: CacheFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache {:?}", self.path))?;

        info!("Loaded snapshot saved at {} ({})", cache.saved_at, short(&cache.fingerprint));
        Ok(Some(cache.snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory {:?}", parent))?;
        }

        let cache = CacheFile {
            snapshot: snapshot.clone(),
            saved_at: Utc::now(),
            fingerprint: snapshot.fingerprint(),
        };
        let json = serde_json::to_string_pretty(&cache)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache to {:?}", self.path))?;

        info!("Cache saved to {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            info!("No cache file to remove");
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove cache {:?}", self.path))?;
        info!("Cache {:?} removed", self.path);
        Ok(true)
    }
}

/// First 12 hex digits, enough to tell snapshots apart in logs.
pub fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
