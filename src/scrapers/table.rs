//! Row scanning over the first `<table>` of a page.

use scraper::{ElementRef, Html, Selector};

use crate::normalize::matches_key;

/// Column holding the team name in every table we read.
pub const KEY_COLUMN: usize = 1;

/// Text of a cell the way the pages render it: every text node trimmed and
/// glued together, so `<td> Vitória <small>(BA)</small></td>` reads
/// `"Vitória(BA)"`.
pub fn cell_text(cell: &ElementRef) -> String {
    cell.text().map(str::trim).collect::<Vec<_>>().join("")
}

/// `<td>` texts of each row of the document's first table, in document order.
/// `None` when the page has no table.
pub fn first_table_rows(document: &Html) -> Option<Vec<Vec<String>>> {
    let table_sel = Selector::parse("table").ok()?;
    let row_sel = Selector::parse("tr").ok()?;
    let cell_sel = Selector::parse("td").ok()?;

    let table = document.select(&table_sel).next()?;
    let rows = table
        .select(&row_sel)
        .map(|row| row.select(&cell_sel).map(|c| cell_text(&c)).collect())
        .collect();
    Some(rows)
}

/// First row with at least `min_columns` cells whose key column folds to
/// `target_key`. Shorter rows (headers, separators) are skipped.
pub fn find_row(rows: Vec<Vec<String>>, target_key: &str, min_columns: usize) -> Option<Vec<String>> {
    rows.into_iter()
        .filter(|cols| cols.len() >= min_columns)
        .find(|cols| matches_key(&cols[KEY_COLUMN], target_key))
}
