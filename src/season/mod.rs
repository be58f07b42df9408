//! Season calendar rules.
//!
//! The league season starts on a fixed, configurable month and day each
//! year (October 1 by default). Dates before that boundary in a calendar
//! year belong to the season that started the previous year.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Requested-date validation failures. These are caller errors, not
/// failures of the standings computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateValidationError {
    #[error("Date cannot be in the future")]
    InFuture { date: NaiveDate, today: NaiveDate },

    #[error("Date must be within the current season (on or after {season_start})")]
    BeforeSeasonStart {
        date: NaiveDate,
        season_start: NaiveDate,
    },
}

/// Season boundary configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonConfig {
    #[serde(default = "default_start_month")]
    pub start_month: u32,

    #[serde(default = "default_start_day")]
    pub start_day: u32,
}

fn default_start_month() -> u32 {
    10
}

fn default_start_day() -> u32 {
    1
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            start_month: default_start_month(),
            start_day: default_start_day(),
        }
    }
}

impl SeasonConfig {
    /// Season start within the given calendar year, if the configured
    /// month/day is a real date in that year.
    pub fn start_in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.start_month, self.start_day)
    }

    /// Check that the month/day pair is usable. Feb 29 is rejected because
    /// it only exists in leap years.
    pub fn is_valid(&self) -> bool {
        self.start_in_year(2023).is_some()
    }
}

/// Start of the season containing `date`.
pub fn season_start(date: NaiveDate, config: &SeasonConfig) -> NaiveDate {
    let this_year = config.start_in_year(date.year());
    match this_year {
        Some(start) if date >= start => start,
        _ => config
            .start_in_year(date.year() - 1)
            .unwrap_or(NaiveDate::MIN),
    }
}

/// Reject dates in the future and dates before the current season start.
pub fn validate_requested_date(
    date: NaiveDate,
    today: NaiveDate,
    config: &SeasonConfig,
) -> Result<(), DateValidationError> {
    if date > today {
        return Err(DateValidationError::InFuture { date, today });
    }

    let current_start = season_start(today, config);
    if date < current_start {
        return Err(DateValidationError::BeforeSeasonStart {
            date,
            season_start: current_start,
        });
    }

    Ok(())
}
