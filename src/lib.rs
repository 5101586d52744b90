//! Standings bot library
//!
//! Scrapes a team's league standings and outcome probabilities, detects
//! changes since the last post and publishes a short summary.

pub mod change;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod normalize;
pub mod notify;
pub mod percent;
pub mod pipeline;
pub mod scrapers;
pub mod storage;
pub mod types;

pub use types::*;
