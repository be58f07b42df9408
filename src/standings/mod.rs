//! Standings orchestration.
//!
//! Serves standings for a date from the snapshot store, computing and
//! publishing the snapshot first when the date has never been requested:
//! 1. Cache check on the snapshot store
//! 2. Upstream fetch over the watermark window
//! 3. Ranking over every stored game up to the date
//! 4. Snapshot publication
//! 5. Grouped read-back

mod claims;
mod watermark;

pub use claims::{DateClaim, DateClaims};
pub use watermark::determine_fetch_start;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculate;
use crate::fetch::GameSource;
use crate::ingest::{fetch_and_store_games, IngestError};
use crate::models::{Conference, Division, GroupBy, StandingsSnapshot, TeamId, WinPct};
use crate::season::SeasonConfig;
use crate::storage::{LeagueStore, SnapshotStore, StorageError};

#[derive(Debug, Error)]
pub enum StandingsError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One line of a grouped standings table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingEntry {
    pub rank: u32,
    pub team_name: String,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: WinPct,
}

/// Group name to its rows, ordered by rank.
pub type GroupedStandings = BTreeMap<String, Vec<StandingEntry>>;

/// Computes, caches and serves standings by date.
pub struct StandingsService {
    league: Arc<dyn LeagueStore>,
    snapshots: Arc<dyn SnapshotStore>,
    source: Arc<dyn GameSource>,
    season: SeasonConfig,
    claims: DateClaims,
}

impl StandingsService {
    pub fn new(
        league: Arc<dyn LeagueStore>,
        snapshots: Arc<dyn SnapshotStore>,
        source: Arc<dyn GameSource>,
        season: SeasonConfig,
    ) -> Self {
        Self {
            league,
            snapshots,
            source,
            season,
            claims: DateClaims::new(),
        }
    }

    pub fn season(&self) -> &SeasonConfig {
        &self.season
    }

    /// Standings as of `date`, grouped by division or conference.
    ///
    /// The date is assumed to have passed caller-side validation.
    pub async fn get_standings(
        &self,
        date: NaiveDate,
        group_by: GroupBy,
    ) -> Result<GroupedStandings, StandingsError> {
        self.ensure_snapshot(date).await?;
        Ok(self.read_grouped(date, group_by)?)
    }

    /// Make sure a snapshot for `date` is published.
    ///
    /// Returns true if this call computed it.
    pub async fn ensure_snapshot(&self, date: NaiveDate) -> Result<bool, StandingsError> {
        if self.snapshots.exists_for_date(date)? {
            debug!(%date, "Snapshot cache hit");
            return Ok(false);
        }

        let _claim = self.claims.acquire(date).await;
        if self.snapshots.exists_for_date(date)? {
            debug!(%date, "Snapshot published while waiting for claim");
            return Ok(false);
        }

        info!(%date, "Snapshot cache miss, computing");
        self.compute_snapshot(date).await?;
        Ok(true)
    }

    async fn compute_snapshot(&self, date: NaiveDate) -> Result<(), StandingsError> {
        let start = determine_fetch_start(self.league.as_ref(), date, &self.season)?;
        if start <= date {
            info!(%start, end = %date, "Fetching upstream window");
            fetch_and_store_games(self.source.as_ref(), self.league.as_ref(), start, date).await?;
        } else {
            debug!(%date, latest = %start, "Stored games already extend past date, skipping fetch");
        }

        let games = self.league.games_up_to(date)?;
        let teams = self.league.teams()?;
        if teams.is_empty() {
            warn!(%date, "Roster is empty, snapshot will have no rows");
        }
        debug!(%date, games = games.len(), teams = teams.len(), "Loaded games for ranking");

        let rows: Vec<StandingsSnapshot> = calculate::rank_standings(&games, &teams)
            .iter()
            .map(|standing| StandingsSnapshot::from_standing(date, standing))
            .collect();

        let saved = self.snapshots.save_all(&rows)?;
        info!(%date, rows = saved, "Snapshot saved");
        Ok(())
    }

    fn read_grouped(
        &self,
        date: NaiveDate,
        group_by: GroupBy,
    ) -> Result<GroupedStandings, StorageError> {
        let names: HashMap<TeamId, String> = self
            .league
            .teams()?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        let mut grouped = GroupedStandings::new();
        match group_by {
            GroupBy::Division => {
                for division in Division::ALL {
                    let rows = self.snapshots.find_by_date_and_division(date, division)?;
                    grouped.insert(
                        division.to_string(),
                        to_entries(rows, &names, |r| r.division_rank),
                    );
                }
            }
            GroupBy::Conference => {
                for conference in Conference::ALL {
                    let rows = self.snapshots.find_by_date_and_conference(date, conference)?;
                    grouped.insert(
                        conference.to_string(),
                        to_entries(rows, &names, |r| r.conference_rank),
                    );
                }
            }
        }
        Ok(grouped)
    }
}

fn to_entries<F>(
    rows: Vec<StandingsSnapshot>,
    names: &HashMap<TeamId, String>,
    rank: F,
) -> Vec<StandingEntry>
where
    F: Fn(&StandingsSnapshot) -> u32,
{
    let mut entries: Vec<StandingEntry> = rows
        .iter()
        .filter_map(|row| {
            let Some(name) = names.get(&row.team_id) else {
                warn!(team_id = %row.team_id, "Snapshot row for unknown team, skipping");
                return None;
            };
            Some(StandingEntry {
                rank: rank(row),
                team_name: name.clone(),
                wins: row.wins,
                losses: row.losses,
                win_pct: row.win_pct,
            })
        })
        .collect();
    entries.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.team_name.cmp(&b.team_name)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, UpstreamGame};
    use crate::models::{default_roster, GameResult};
    use crate::storage::{JsonlStore, StorageConfig};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn upstream(id: u64, date: &str, status: &str, home: u64, away: u64, hs: u32, vs: u32) -> UpstreamGame {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "date": date,
            "status": status,
            "home_team": {"id": home},
            "visitor_team": {"id": away},
            "home_team_score": hs,
            "visitor_team_score": vs,
        }))
        .unwrap()
    }

    /// Serves fixed games and records every window it is asked for.
    #[derive(Default)]
    struct RecordingSource {
        games: Vec<UpstreamGame>,
        windows: Mutex<Vec<(NaiveDate, NaiveDate)>>,
        delay: Option<Duration>,
        fail: bool,
    }

    impl RecordingSource {
        fn with_games(games: Vec<UpstreamGame>) -> Self {
            Self {
                games,
                ..Default::default()
            }
        }

        fn windows(&self) -> Vec<(NaiveDate, NaiveDate)> {
            self.windows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GameSource for RecordingSource {
        async fn fetch_games(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<UpstreamGame>, FetchError> {
            self.windows.lock().unwrap().push((start, end));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(FetchError::HttpStatus {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                });
            }
            Ok(self
                .games
                .iter()
                .filter(|g| g.date >= start && g.date <= end)
                .cloned()
                .collect())
        }
    }

    /// Snapshot store wrapper counting publications.
    struct CountingSnapshots {
        inner: Arc<JsonlStore>,
        saves: AtomicUsize,
    }

    impl SnapshotStore for CountingSnapshots {
        fn exists_for_date(&self, date: NaiveDate) -> Result<bool, StorageError> {
            self.inner.exists_for_date(date)
        }

        fn save_all(&self, rows: &[StandingsSnapshot]) -> Result<usize, StorageError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save_all(rows)
        }

        fn find_by_date_and_division(
            &self,
            date: NaiveDate,
            division: Division,
        ) -> Result<Vec<StandingsSnapshot>, StorageError> {
            self.inner.find_by_date_and_division(date, division)
        }

        fn find_by_date_and_conference(
            &self,
            date: NaiveDate,
            conference: Conference,
        ) -> Result<Vec<StandingsSnapshot>, StorageError> {
            self.inner.find_by_date_and_conference(date, conference)
        }
    }

    struct Harness {
        _temp_dir: TempDir,
        store: Arc<JsonlStore>,
        snapshots: Arc<CountingSnapshots>,
        source: Arc<RecordingSource>,
        service: StandingsService,
    }

    fn harness(source: RecordingSource) -> Harness {
        let temp_dir = TempDir::new().unwrap();
        let store =
            Arc::new(JsonlStore::open(StorageConfig::new(temp_dir.path().to_path_buf())).unwrap());
        store.seed_teams(&default_roster()).unwrap();

        let snapshots = Arc::new(CountingSnapshots {
            inner: Arc::clone(&store),
            saves: AtomicUsize::new(0),
        });
        let source = Arc::new(source);
        let service = StandingsService::new(
            store.clone(),
            snapshots.clone(),
            source.clone(),
            SeasonConfig::default(),
        );

        Harness {
            _temp_dir: temp_dir,
            store,
            snapshots,
            source,
            service,
        }
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let h = harness(RecordingSource::with_games(vec![upstream(
            1, "2024-10-22", "Final", 2, 20, 132, 109,
        )]));
        let date = ymd(2024, 10, 24);

        let first = h.service.get_standings(date, GroupBy::Division).await.unwrap();
        let second = h.service.get_standings(date, GroupBy::Division).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.source.windows().len(), 1);
        assert_eq!(h.snapshots.saves.load(Ordering::SeqCst), 1);

        // A different grouping of the same date is still a cache hit
        h.service.get_standings(date, GroupBy::Conference).await.unwrap();
        assert_eq!(h.source.windows().len(), 1);
        assert_eq!(h.snapshots.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_window_starts_at_latest_stored_game() {
        let h = harness(RecordingSource::default());
        h.store
            .append_games(&[GameResult::new(
                1,
                ymd(2024, 10, 22),
                TeamId::new(2),
                TeamId::new(20),
                110,
                100,
            )])
            .unwrap();

        h.service
            .get_standings(ymd(2024, 10, 24), GroupBy::Division)
            .await
            .unwrap();

        assert_eq!(h.source.windows(), vec![(ymd(2024, 10, 22), ymd(2024, 10, 24))]);
    }

    #[tokio::test]
    async fn test_fetch_window_without_games_starts_at_season() {
        let h = harness(RecordingSource::default());

        h.service
            .get_standings(ymd(2025, 11, 12), GroupBy::Conference)
            .await
            .unwrap();

        assert_eq!(h.source.windows(), vec![(ymd(2025, 10, 1), ymd(2025, 11, 12))]);
    }

    #[tokio::test]
    async fn test_earlier_date_than_stored_games_skips_fetch() {
        let h = harness(RecordingSource::default());
        h.store
            .append_games(&[
                GameResult::new(1, ymd(2024, 10, 22), TeamId::new(2), TeamId::new(20), 110, 100),
                GameResult::new(2, ymd(2024, 10, 30), TeamId::new(20), TeamId::new(2), 110, 100),
            ])
            .unwrap();

        let standings = h
            .service
            .get_standings(ymd(2024, 10, 25), GroupBy::Division)
            .await
            .unwrap();

        assert!(h.source.windows().is_empty());
        let atlantic = &standings["ATLANTIC"];
        assert_eq!(atlantic[0].team_name, "Boston Celtics");
        assert_eq!((atlantic[0].wins, atlantic[0].losses), (1, 0));
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_no_snapshot() {
        let h = harness(RecordingSource {
            fail: true,
            ..Default::default()
        });
        let date = ymd(2024, 10, 24);

        let err = h
            .service
            .get_standings(date, GroupBy::Division)
            .await
            .unwrap_err();

        assert!(matches!(err, StandingsError::Ingest(IngestError::Fetch(_))));
        assert!(!h.store.exists_for_date(date).unwrap());
        assert_eq!(h.snapshots.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_groups_are_complete_and_ranked() {
        let h = harness(RecordingSource::with_games(vec![
            // Celtics beat the Knicks, Lakers beat the Warriors, one game still live
            upstream(1, "2024-10-22", "Final", 2, 20, 132, 109),
            upstream(2, "2024-10-22", "Final", 14, 10, 110, 103),
            upstream(3, "2024-10-23", "In Progress", 23, 3, 60, 55),
        ]));
        let date = ymd(2024, 10, 23);

        let by_division = h.service.get_standings(date, GroupBy::Division).await.unwrap();
        assert_eq!(
            by_division.keys().cloned().collect::<Vec<_>>(),
            vec!["ATLANTIC", "CENTRAL", "NORTHWEST", "PACIFIC", "SOUTHEAST", "SOUTHWEST"]
        );
        for entries in by_division.values() {
            let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
            assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        }

        let atlantic = &by_division["ATLANTIC"];
        assert_eq!(atlantic[0].team_name, "Boston Celtics");
        assert_eq!(atlantic[0].win_pct.to_string(), "1.000");
        // 0-1 and 0-0 share a .000 win% and zero wins, so the name decides
        assert_eq!(atlantic[2].team_name, "New York Knicks");
        assert_eq!(atlantic[2].losses, 1);
        // Untouched by the live game
        let sixers = atlantic.iter().find(|e| e.team_name == "Philadelphia 76ers").unwrap();
        assert_eq!((sixers.wins, sixers.losses), (0, 0));

        let by_conference = h.service.get_standings(date, GroupBy::Conference).await.unwrap();
        assert_eq!(by_conference.len(), 2);
        let west = &by_conference["WESTERN"];
        assert_eq!(west.len(), 15);
        assert_eq!(west[0].team_name, "Los Angeles Lakers");
        let warriors = west.iter().find(|e| e.team_name == "Golden State Warriors").unwrap();
        assert_eq!((warriors.wins, warriors.losses), (0, 1));
        assert_eq!(warriors.rank, 4);
    }

    #[tokio::test]
    async fn test_concurrent_requests_fetch_once() {
        let h = harness(RecordingSource {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let date = ymd(2024, 10, 24);

        let (a, b, c) = tokio::join!(
            h.service.get_standings(date, GroupBy::Division),
            h.service.get_standings(date, GroupBy::Conference),
            h.service.get_standings(date, GroupBy::Division),
        );

        assert_eq!(a.unwrap(), c.unwrap());
        assert_eq!(b.unwrap().len(), 2);
        assert_eq!(h.source.windows().len(), 1);
        assert_eq!(h.snapshots.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ensure_snapshot_reports_computation() {
        let h = harness(RecordingSource::default());
        let date = ymd(2024, 11, 1);

        assert!(h.service.ensure_snapshot(date).await.unwrap());
        assert!(!h.service.ensure_snapshot(date).await.unwrap());
    }
}
