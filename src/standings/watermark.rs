//! Fetch watermark: where the next upstream fetch should begin.

use chrono::NaiveDate;

use crate::season::{season_start, SeasonConfig};
use crate::storage::{LeagueStore, StorageError};

/// Earliest date that must be fetched to bring storage up to `requested`.
///
/// With games stored, this is the date of the most recent one, inclusive:
/// that day may have been fetched before all of its games were final.
/// With no games stored, it is the start of the season containing
/// `requested`.
pub fn determine_fetch_start(
    store: &dyn LeagueStore,
    requested: NaiveDate,
    season: &SeasonConfig,
) -> Result<NaiveDate, StorageError> {
    Ok(match store.most_recent_game_date()? {
        Some(latest) => latest,
        None => season_start(requested, season),
    })
}
