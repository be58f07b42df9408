//! Computed team standings.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Team;

/// Winning percentage with three decimal places, stored as thousandths.
///
/// Integer storage keeps the standings order exact: two records that print
/// the same always compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WinPct(u16);

impl WinPct {
    pub const ZERO: WinPct = WinPct(0);

    /// Compute wins / (wins + losses), rounded half-up to three decimals.
    /// Zero games played gives exactly zero.
    pub fn from_record(wins: u32, losses: u32) -> Self {
        let total = u64::from(wins) + u64::from(losses);
        if total == 0 {
            return Self::ZERO;
        }
        let thousandths = (u64::from(wins) * 2000 + total) / (2 * total);
        Self(thousandths as u16)
    }

    pub fn thousandths(&self) -> u16 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.0) / 1000.0
    }
}

impl fmt::Display for WinPct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

impl Serialize for WinPct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for WinPct {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !(0.0..=1.0).contains(&value) {
            return Err(serde::de::Error::custom(format!(
                "winning percentage out of range: {}",
                value
            )));
        }
        Ok(Self((value * 1000.0).round() as u16))
    }
}

/// A team's record as of some date, optionally with its group ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamStanding {
    pub team: Team,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: WinPct,
    pub division_rank: Option<u32>,
    pub conference_rank: Option<u32>,
}

impl TeamStanding {
    /// A 0-0 standing with no ranks.
    pub fn new(team: Team) -> Self {
        Self {
            team,
            wins: 0,
            losses: 0,
            win_pct: WinPct::ZERO,
            division_rank: None,
            conference_rank: None,
        }
    }

    /// Standing with the given record and its derived winning percentage.
    pub fn with_record(team: Team, wins: u32, losses: u32) -> Self {
        Self {
            win_pct: WinPct::from_record(wins, losses),
            wins,
            losses,
            ..Self::new(team)
        }
    }

    /// Copy of this standing carrying the given ranks.
    pub fn with_ranks(&self, division_rank: u32, conference_rank: u32) -> Self {
        Self {
            division_rank: Some(division_rank),
            conference_rank: Some(conference_rank),
            ..self.clone()
        }
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }
}

/// Natural standings order: win% desc, then wins desc, then team name asc.
pub fn standing_order(a: &TeamStanding, b: &TeamStanding) -> Ordering {
    b.win_pct
        .cmp(&a.win_pct)
        .then(b.wins.cmp(&a.wins))
        .then_with(|| a.team.name.cmp(&b.team.name))
}
