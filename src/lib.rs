//! # League Standings
//!
//! Date-keyed league standings with incremental game fetching and snapshot
//! caching.
//!
//! ## Architecture
//!
//! - **models**: Teams, games, standings and snapshot rows
//! - **calculate**: Win/loss records and division/conference ranking
//! - **season**: Season boundary and requested-date validation
//! - **fetch**: Paginated upstream games API client
//! - **ingest**: Fetch-and-persist of final game results
//! - **storage**: JSONL data directory (roster, games, snapshots)
//! - **standings**: Cached standings orchestration
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod season;
pub mod standings;
pub mod storage;

pub use models::*;

use std::time::Duration;

/// Parse a duration like "30s", "2m" or "1h". A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        (s, 1)
    };

    let num: u64 = num_str.trim().parse().ok()?;
    num.checked_mul(multiplier).map(Duration::from_secs)
}
