use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One team's row of the league table, kept as the text the page shows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StandingsRecord {
    pub position: String,
    pub points: String,
    pub games: String,
    pub wins: String,
    pub draws: String,
    pub losses: String,
    pub goal_difference: String,
    pub efficiency: String,
}

/// Raw probability text per objective key. `None` means the objective's page
/// had no row for the team or could not be fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ProbabilitySet(BTreeMap<String, Option<String>>);

impl ProbabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, objective: impl Into<String>, value: Option<String>) {
        self.0.insert(objective.into(), value);
    }

    /// Raw value for an objective, if the objective was extracted.
    pub fn get(&self, objective: &str) -> Option<&str> {
        self.0.get(objective).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, objective: &str) -> bool {
        self.0.contains_key(objective)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for ProbabilitySet {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Everything one extraction pass produced. Compared against the last
/// published snapshot and persisted after a successful post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Snapshot {
    pub standings: Option<StandingsRecord>,
    pub probabilities: ProbabilitySet,
}

impl Snapshot {
    /// SHA-256 of the snapshot's JSON form, hex encoded.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Identifier of a published post, as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Post text ready for publishing: one chunk, or several for a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    pub chunks: Vec<String>,
}

impl RenderedPost {
    pub fn single(text: String) -> Self {
        Self { chunks: vec![text] }
    }

    pub fn thread(chunks: Vec<String>) -> Self {
        Self { chunks }
    }

    pub fn is_thread(&self) -> bool {
        self.chunks.len() > 1
    }
}

/// How a pipeline run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Data identical to the last post and no force flag.
    Skipped,
    /// Preview mode: rendered only.
    Previewed(RenderedPost),
    /// Posted. `cache_updated` is false when the snapshot could not be saved.
    Published { ids: Vec<PostId>, cache_updated: bool },
}
