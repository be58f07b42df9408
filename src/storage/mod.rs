//! Filesystem storage for the league data directory.
//!
//! Layout under `data_dir`:
//! - `teams.jsonl`: the seeded roster
//! - `games.jsonl`: final game results, append-only
//! - `snapshots/<date>.jsonl`: one published standings snapshot per date

mod jsonl;
mod league;

pub use jsonl::{JsonlReader, JsonlWriter};
pub use league::JsonlStore;

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Conference, Division, GameResult, StandingsSnapshot, Team, TeamId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Snapshot for {date} already exists (team {team_id})")]
    DuplicateSnapshot { date: NaiveDate, team_id: TeamId },
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn teams_path(&self) -> PathBuf {
        self.data_dir.join("teams.jsonl")
    }

    pub fn games_path(&self) -> PathBuf {
        self.data_dir.join("games.jsonl")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }

    pub fn snapshot_path(&self, date: NaiveDate) -> PathBuf {
        self.snapshots_dir()
            .join(format!("{}.jsonl", date.format("%Y-%m-%d")))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Roster and game-result tables.
pub trait LeagueStore: Send + Sync {
    /// Full roster. Empty until seeded.
    fn teams(&self) -> Result<Vec<Team>, StorageError>;

    /// Write the roster if none is stored yet. Returns the number of teams
    /// written, zero when a roster already exists.
    fn seed_teams(&self, teams: &[Team]) -> Result<usize, StorageError>;

    /// All stored games played on or before `date`.
    fn games_up_to(&self, date: NaiveDate) -> Result<Vec<GameResult>, StorageError>;

    /// Date of the latest stored game, if any.
    fn most_recent_game_date(&self) -> Result<Option<NaiveDate>, StorageError>;

    fn known_game_ids(&self) -> Result<HashSet<u64>, StorageError>;

    /// Append games in one batch, skipping ids already stored or repeated
    /// within the batch. Returns the number written.
    fn append_games(&self, games: &[GameResult]) -> Result<usize, StorageError>;
}

/// Date-keyed standings snapshots.
pub trait SnapshotStore: Send + Sync {
    /// True iff a snapshot has been published for `date`.
    fn exists_for_date(&self, date: NaiveDate) -> Result<bool, StorageError>;

    /// Publish one row per team for a single date. Fails with
    /// `DuplicateSnapshot` if the date already has rows.
    fn save_all(&self, rows: &[StandingsSnapshot]) -> Result<usize, StorageError>;

    /// Rows for the teams of one division, unordered.
    fn find_by_date_and_division(
        &self,
        date: NaiveDate,
        division: Division,
    ) -> Result<Vec<StandingsSnapshot>, StorageError>;

    /// Rows for the teams of one conference, unordered.
    fn find_by_date_and_conference(
        &self,
        date: NaiveDate,
        conference: Conference,
    ) -> Result<Vec<StandingsSnapshot>, StorageError>;
}
