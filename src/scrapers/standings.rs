use scraper::Html;
use tracing::{info, warn};

use super::table::{find_row, first_table_rows};
use crate::types::StandingsRecord;

/// Cells a league-table row must have to be read.
pub const STANDINGS_MIN_COLUMNS: usize = 11;

const ORDINAL_MARKER: &str = "º";

/// Find the target team in the league table and map its row.
///
/// Columns: 0 position, 1 team, 2 points, 3 games, 4 wins, 5 draws,
/// 6 losses, 9 goal difference, 10 efficiency.
pub fn find_standings_row(
    document: &Html,
    target_key: &str,
    games_in_season: u32,
) -> Option<StandingsRecord> {
    let Some(rows) = first_table_rows(document) else {
        warn!("No table on the standings page");
        return None;
    };

    let Some(cols) = find_row(rows, target_key, STANDINGS_MIN_COLUMNS) else {
        warn!("{} not found in the standings table", target_key);
        return None;
    };

    info!("{} found in position {}", target_key, cols[0]);
    Some(StandingsRecord {
        position: format!("{}{}", cols[0], ORDINAL_MARKER),
        points: cols[2].clone(),
        games: format!("{}/{}", cols[3], games_in_season),
        wins: cols[4].clone(),
        draws: cols[5].clone(),
        losses: cols[6].clone(),
        goal_difference: cols[9].clone(),
        efficiency: format!("{}%", cols[10]),
    })
}
