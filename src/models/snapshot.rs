//! Persisted standings snapshot rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{TeamId, TeamStanding, WinPct};

/// One team's computed standing as of `snapshot_date`.
///
/// Written once per (date, team) and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsSnapshot {
    pub snapshot_date: NaiveDate,
    pub team_id: TeamId,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: WinPct,
    pub division_rank: u32,
    pub conference_rank: u32,
    pub created_at: DateTime<Utc>,
}

impl StandingsSnapshot {
    /// Build a snapshot row from a ranked standing.
    ///
    /// Unranked standings get rank 0, which sorts ahead of every real rank;
    /// the orchestrator only persists ranked standings.
    pub fn from_standing(snapshot_date: NaiveDate, standing: &TeamStanding) -> Self {
        Self {
            snapshot_date,
            team_id: standing.team.id,
            wins: standing.wins,
            losses: standing.losses,
            win_pct: standing.win_pct,
            division_rank: standing.division_rank.unwrap_or(0),
            conference_rank: standing.conference_rank.unwrap_or(0),
            created_at: Utc::now(),
        }
    }
}
