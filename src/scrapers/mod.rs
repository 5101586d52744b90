mod fetch;
mod probability;
mod standings;
pub mod table;

pub use fetch::{HttpFetcher, PageFetcher};
pub use probability::{find_probability_row, PROBABILITY_MIN_COLUMNS};
pub use standings::{find_standings_row, STANDINGS_MIN_COLUMNS};
