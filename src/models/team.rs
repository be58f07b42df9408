//! Team roster model and league groupings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Internal roster identifier for a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(u32);

impl TeamId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a grouping name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value '{value}' for {kind}. Must be one of: {expected}")]
pub struct ParseGroupingError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Conference a division belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Conference {
    Eastern,
    Western,
}

impl Conference {
    pub const ALL: [Conference; 2] = [Conference::Eastern, Conference::Western];

    pub fn as_str(&self) -> &'static str {
        match self {
            Conference::Eastern => "EASTERN",
            Conference::Western => "WESTERN",
        }
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six league divisions, three per conference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Division {
    Atlantic,
    Central,
    Southeast,
    Northwest,
    Pacific,
    Southwest,
}

impl Division {
    pub const ALL: [Division; 6] = [
        Division::Atlantic,
        Division::Central,
        Division::Southeast,
        Division::Northwest,
        Division::Pacific,
        Division::Southwest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Division::Atlantic => "ATLANTIC",
            Division::Central => "CENTRAL",
            Division::Southeast => "SOUTHEAST",
            Division::Northwest => "NORTHWEST",
            Division::Pacific => "PACIFIC",
            Division::Southwest => "SOUTHWEST",
        }
    }

    pub fn conference(&self) -> Conference {
        match self {
            Division::Atlantic | Division::Central | Division::Southeast => Conference::Eastern,
            Division::Northwest | Division::Pacific | Division::Southwest => Conference::Western,
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a standings response is grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupBy {
    Division,
    Conference,
}

impl GroupBy {
    pub const ALL: [GroupBy; 2] = [GroupBy::Division, GroupBy::Conference];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Division => "DIVISION",
            GroupBy::Conference => "CONFERENCE",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = ParseGroupingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupBy::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseGroupingError {
                kind: "groupBy",
                value: s.to_string(),
                expected: joined(GroupBy::ALL.iter().map(|g| g.as_str())),
            })
    }
}

fn joined<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// A league team. Seeded once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Internal roster id
    pub id: TeamId,

    /// Team id used by the upstream games API
    pub upstream_id: u64,

    /// Display name (e.g., "Boston Celtics")
    pub name: String,

    /// Short code (e.g., "BOS")
    pub abbreviation: String,

    pub division: Division,
}

impl Team {
    pub fn new(
        id: u32,
        upstream_id: u64,
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        division: Division,
    ) -> Self {
        Self {
            id: TeamId::new(id),
            upstream_id,
            name: name.into(),
            abbreviation: abbreviation.into(),
            division,
        }
    }

    pub fn conference(&self) -> Conference {
        self.division.conference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_division_has_one_conference() {
        let eastern: Vec<_> = Division::ALL
            .iter()
            .filter(|d| d.conference() == Conference::Eastern)
            .collect();
        assert_eq!(eastern.len(), 3);
        assert_eq!(Division::Pacific.conference(), Conference::Western);
    }

    #[test]
    fn test_group_by_parse_case_insensitive() {
        assert_eq!("division".parse::<GroupBy>().unwrap(), GroupBy::Division);
        assert_eq!("CONFERENCE".parse::<GroupBy>().unwrap(), GroupBy::Conference);
        assert_eq!(" Division ".parse::<GroupBy>().unwrap(), GroupBy::Division);
    }

    #[test]
    fn test_group_by_parse_invalid_lists_values() {
        let err = "league".parse::<GroupBy>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'league'"));
        assert!(msg.contains("DIVISION, CONFERENCE"));
    }

    #[test]
    fn test_division_serializes_as_bare_name() {
        let json = serde_json::to_string(&Division::Southwest).unwrap();
        assert_eq!(json, "\"SOUTHWEST\"");
        let parsed: Division = serde_json::from_str("\"NORTHWEST\"").unwrap();
        assert_eq!(parsed, Division::Northwest);
    }

    #[test]
    fn test_team_conference_follows_division() {
        let team = Team::new(1, 2, "Boston Celtics", "BOS", Division::Atlantic);
        assert_eq!(team.conference(), Conference::Eastern);
        assert_eq!(team.id, TeamId::new(1));
    }
}
