//! Post text: assembly, truncation and thread splitting.
//!
//! Lengths are counted in Unicode scalar values.

use chrono::NaiveDate;
use tracing::warn;

use crate::config::{ObjectiveConfig, PostConfig, TeamConfig};
use crate::percent::{format_percent, parse_percent};
use crate::types::{ProbabilitySet, RenderedPost, Snapshot, StandingsRecord};

pub const ELLIPSIS: &str = "...";

/// Builds post text from a snapshot using the configured labels.
pub struct PostRenderer<'a> {
    pub team: &'a TeamConfig,
    pub post: &'a PostConfig,
    pub objectives: &'a [ObjectiveConfig],
}

impl<'a> PostRenderer<'a> {
    pub fn new(team: &'a TeamConfig, post: &'a PostConfig, objectives: &'a [ObjectiveConfig]) -> Self {
        Self { team, post, objectives }
    }

    /// Full post text with no length limit.
    pub fn assemble(&self, snapshot: &Snapshot, today: NaiveDate) -> String {
        let mut parts = vec![
            format!("{} {}", self.team.label, self.team.marker),
            format!("{} {}", self.post.calendar_marker, today.format("%d/%m/%y")),
        ];

        match &snapshot.standings {
            Some(record) => parts.push(self.format_standings(record)),
            None => {
                warn!("Standings not available");
                parts.push(format!(
                    "\n{} {}",
                    self.post.standings_marker, self.post.unavailable_text
                ));
            }
        }

        parts.extend(self.probability_lines(&snapshot.probabilities));
        parts.push(format!("\nFonte: {}", self.post.source));

        parts.join("\n")
    }

    /// Post text cut to `post.max_chars`.
    pub fn render(&self, snapshot: &Snapshot, today: NaiveDate) -> String {
        let text = self.assemble(snapshot, today);
        let length = text.chars().count();
        if length > self.post.max_chars {
            warn!("Post exceeds {} characters ({}), truncating", self.post.max_chars, length);
        }
        truncate_to_budget(&text, self.post.max_chars)
    }

    /// Single truncated post, or a thread when `thread` is set and the full
    /// text does not fit.
    pub fn render_post(&self, snapshot: &Snapshot, today: NaiveDate, thread: bool) -> RenderedPost {
        if !thread {
            return RenderedPost::single(self.render(snapshot, today));
        }

        let text = self.assemble(snapshot, today);
        if text.chars().count() <= self.post.max_chars {
            return RenderedPost::single(text);
        }
        RenderedPost::thread(split_into_chunks(&text, self.post.max_chars))
    }

    fn format_standings(&self, record: &StandingsRecord) -> String {
        format!(
            "\n{} {}\n\
             Posicao: {}\n\
             Pnts: {}\n\
             Jogos: {}\n\
             {} V: {} | E: {} | D: {}\n\
             SG: {}\n\
             Rendimento: {}",
            self.post.standings_marker,
            self.post.competition,
            record.position,
            record.points,
            record.games,
            self.post.goals_marker,
            record.wins,
            record.draws,
            record.losses,
            record.goal_difference,
            record.efficiency,
        )
    }

    fn probability_lines(&self, probabilities: &ProbabilitySet) -> Vec<String> {
        self.objectives
            .iter()
            .filter_map(|objective| match probabilities.get(&objective.key) {
                Some(raw) if !raw.trim().is_empty() => Some(format_probability(objective, raw)),
                _ => {
                    warn!("Probability for '{}' not available", objective.key);
                    None
                }
            })
            .collect()
    }
}

/// `"{marker} {label}\n(%): 15.50%"`, or the raw text when it is not a number.
pub fn format_probability(objective: &ObjectiveConfig, raw: &str) -> String {
    match parse_percent(raw) {
        Ok(value) => format!(
            "{} {}\n(%): {}",
            objective.marker,
            objective.label,
            format_percent(value)
        ),
        Err(e) => {
            warn!("Could not convert probability for '{}': {}", objective.key, e);
            format!("{} {}: {}", objective.marker, objective.label, raw)
        }
    }
}

/// Cut `text` to at most `budget` characters, ending with `...` when cut.
/// The cut ignores line boundaries and may drop the footer.
pub fn truncate_to_budget(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let marker_len = ELLIPSIS.chars().count();
    if budget <= marker_len {
        return text.chars().take(budget).collect();
    }
    let mut out: String = text.chars().take(budget - marker_len).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Split `text` into chunks of at most `budget` characters, keeping whole
/// lines together where possible. Lines longer than `budget` are cut into
/// `budget`-sized pieces. Each chunk has trailing whitespace removed; empty
/// chunks are dropped.
pub fn split_into_chunks(text: &str, budget: usize) -> Vec<String> {
    if budget == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n').flat_map(|line| hard_split(line, budget)) {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > budget {
            seal(&mut chunks, &current);
            current.clear();
            current_len = 0;
        }
        current.push_str(&line);
        current.push('\n');
        current_len += line_len + 1;
    }
    seal(&mut chunks, &current);

    chunks
}

fn seal(chunks: &mut Vec<String>, current: &str) {
    let trimmed = current.trim_end();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn hard_split(line: &str, budget: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= budget {
        return vec![line.to_string()];
    }
    chars.chunks(budget).map(|piece| piece.iter().collect()).collect()
}
