//! JSONL-backed league and snapshot store.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::{JsonlReader, JsonlWriter, LeagueStore, SnapshotStore, StorageConfig, StorageError};
use crate::models::{Conference, Division, GameResult, StandingsSnapshot, Team, TeamId};

/// Store over a local data directory.
///
/// Safe to share between tasks. Game appends are serialized in-process;
/// snapshot publication relies on the filesystem's create-or-fail link.
pub struct JsonlStore {
    config: StorageConfig,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Open a store, creating the data directories if needed.
    pub fn open(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        fs::create_dir_all(config.snapshots_dir())?;
        Ok(Self {
            config,
            write_lock: Mutex::new(()),
        })
    }

    fn games(&self) -> JsonlReader<GameResult> {
        JsonlReader::new(self.config.games_path())
    }

    fn snapshot_rows(&self, date: NaiveDate) -> Result<Vec<StandingsSnapshot>, StorageError> {
        JsonlReader::new(self.config.snapshot_path(date)).read_all()
    }

    /// Snapshot rows for `date` whose team satisfies `keep`.
    fn snapshot_rows_where<F>(
        &self,
        date: NaiveDate,
        keep: F,
    ) -> Result<Vec<StandingsSnapshot>, StorageError>
    where
        F: Fn(&Team) -> bool,
    {
        let members: HashSet<TeamId> = self
            .teams()?
            .iter()
            .filter(|t| keep(t))
            .map(|t| t.id)
            .collect();

        Ok(self
            .snapshot_rows(date)?
            .into_iter()
            .filter(|row| members.contains(&row.team_id))
            .collect())
    }
}

impl LeagueStore for JsonlStore {
    fn teams(&self) -> Result<Vec<Team>, StorageError> {
        JsonlReader::new(self.config.teams_path()).read_all()
    }

    fn seed_teams(&self, teams: &[Team]) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let existing = JsonlReader::<Team>::new(self.config.teams_path()).count()?;
        if existing > 0 {
            debug!(existing, "Roster already seeded");
            return Ok(0);
        }

        let written = JsonlWriter::new(self.config.teams_path()).write_all(teams)?;
        info!(teams = written, "Seeded roster");
        Ok(written)
    }

    fn games_up_to(&self, date: NaiveDate) -> Result<Vec<GameResult>, StorageError> {
        self.games().read_where(|g| g.date <= date)
    }

    fn most_recent_game_date(&self) -> Result<Option<NaiveDate>, StorageError> {
        Ok(self.games().read_all()?.iter().map(|g| g.date).max())
    }

    fn known_game_ids(&self) -> Result<HashSet<u64>, StorageError> {
        Ok(self
            .games()
            .read_all()?
            .into_iter()
            .map(|g| g.external_id)
            .collect())
    }

    fn append_games(&self, games: &[GameResult]) -> Result<usize, StorageError> {
        if games.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut seen = self.known_game_ids()?;
        let fresh: Vec<&GameResult> = games
            .iter()
            .filter(|g| seen.insert(g.external_id))
            .collect();
        if fresh.len() < games.len() {
            debug!(skipped = games.len() - fresh.len(), "Skipping already stored games");
        }

        JsonlWriter::new(self.config.games_path()).append_batch(&fresh)
    }
}

impl SnapshotStore for JsonlStore {
    fn exists_for_date(&self, date: NaiveDate) -> Result<bool, StorageError> {
        Ok(self.config.snapshot_path(date).is_file())
    }

    fn save_all(&self, rows: &[StandingsSnapshot]) -> Result<usize, StorageError> {
        let Some(first) = rows.first() else {
            return Ok(0);
        };
        let date = first.snapshot_date;

        let mut teams = HashSet::with_capacity(rows.len());
        for row in rows {
            if row.snapshot_date != date {
                return Err(StorageError::InvalidPath(format!(
                    "snapshot batch mixes dates {} and {}",
                    date, row.snapshot_date
                )));
            }
            if !teams.insert(row.team_id) {
                return Err(StorageError::DuplicateSnapshot {
                    date,
                    team_id: row.team_id,
                });
            }
        }

        JsonlWriter::new(self.config.snapshot_path(date))
            .write_new(rows)
            .map_err(|e| match e {
                StorageError::Io(io_err) if io_err.kind() == io::ErrorKind::AlreadyExists => {
                    StorageError::DuplicateSnapshot {
                        date,
                        team_id: first.team_id,
                    }
                }
                other => other,
            })
    }

    fn find_by_date_and_division(
        &self,
        date: NaiveDate,
        division: Division,
    ) -> Result<Vec<StandingsSnapshot>, StorageError> {
        self.snapshot_rows_where(date, |t| t.division == division)
    }

    fn find_by_date_and_conference(
        &self,
        date: NaiveDate,
        conference: Conference,
    ) -> Result<Vec<StandingsSnapshot>, StorageError> {
        self.snapshot_rows_where(date, |t| t.conference() == conference)
    }
}
