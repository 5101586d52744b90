use scraper::Html;
use tracing::{info, warn};

use super::table::{find_row, first_table_rows};

/// Cells a probability row must have to be read.
pub const PROBABILITY_MIN_COLUMNS: usize = 3;

const VALUE_COLUMN: usize = 2;

/// Raw probability text (e.g. `"15,5"`) for the target team on one
/// objective's page.
pub fn find_probability_row(document: &Html, target_key: &str) -> Option<String> {
    let Some(rows) = first_table_rows(document) else {
        warn!("No table on the probability page");
        return None;
    };

    match find_row(rows, target_key, PROBABILITY_MIN_COLUMNS) {
        Some(mut cols) => {
            let value = cols.swap_remove(VALUE_COLUMN);
            info!("Probability for {}: {}", target_key, value);
            Some(value)
        }
        None => {
            warn!("No probability row for {}", target_key);
            None
        }
    }
}
