//! Completed game results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TeamId;

/// A single completed ("Final") game.
///
/// Non-final games are never turned into a `GameResult`, so everything of
/// this type counts toward the standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Upstream game id, unique across storage
    pub external_id: u64,

    /// Date the game was played
    pub date: NaiveDate,

    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_score: u32,
    pub away_score: u32,
}

impl GameResult {
    pub fn new(
        external_id: u64,
        date: NaiveDate,
        home_team: TeamId,
        away_team: TeamId,
        home_score: u32,
        away_score: u32,
    ) -> Self {
        Self {
            external_id,
            date,
            home_team,
            away_team,
            home_score,
            away_score,
        }
    }

    /// Winner and loser of the game.
    ///
    /// The home side wins only with a strictly higher score.
    pub fn winner_and_loser(&self) -> (TeamId, TeamId) {
        if self.home_score > self.away_score {
            (self.home_team, self.away_team)
        } else {
            (self.away_team, self.home_team)
        }
    }
}
