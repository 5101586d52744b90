//! Change detection between a fresh snapshot and the last published one.
//!
//! Comparison is exact on the extracted text: a provider reformatting
//! "39.47%" as "39.5%" counts as a change and triggers a new post.

use tracing::{debug, info};

use crate::types::Snapshot;

/// `true` when there is no previous snapshot or any field differs.
pub fn has_changed(fresh: &Snapshot, previous: Option<&Snapshot>) -> bool {
    let Some(previous) = previous else {
        info!("No previous snapshot, treating data as new");
        return true;
    };

    if fresh == previous {
        info!("Data unchanged since the last post");
        return false;
    }

    for change in describe_changes(fresh, previous) {
        info!("{}", change);
    }
    debug!("Previous: {:?}", previous);
    debug!("Fresh: {:?}", fresh);
    true
}

/// One human-readable line per section that differs.
pub fn describe_changes(fresh: &Snapshot, previous: &Snapshot) -> Vec<String> {
    let mut changes = Vec::new();

    match (&previous.standings, &fresh.standings) {
        (Some(_), None) => changes.push("Standings no longer available".to_string()),
        (None, Some(_)) => changes.push("Standings became available".to_string()),
        (Some(old), Some(new)) if old != new => changes.push(format!(
            "Standings changed: {} {} pts -> {} {} pts",
            old.position, old.points, new.position, new.points
        )),
        _ => {}
    }

    for (objective, new) in fresh.probabilities.iter() {
        if !previous.probabilities.contains(objective) {
            changes.push(format!("Probability '{}' newly tracked", objective));
            continue;
        }
        let old = previous.probabilities.get(objective);
        if old != new {
            changes.push(format!(
                "Probability '{}' changed: {} -> {}",
                objective,
                old.unwrap_or("absent"),
                new.unwrap_or("absent")
            ));
        }
    }
    for (objective, old) in previous.probabilities.iter() {
        if !fresh.probabilities.contains(objective) {
            changes.push(format!(
                "Probability '{}' no longer tracked (was {})",
                objective,
                old.unwrap_or("absent")
            ));
        }
    }

    changes
}
