//! Default league roster.
//!
//! Upstream ids follow the balldontlie games API, which numbers the 30 NBA
//! franchises alphabetically by city.

use super::{Division, Team};

const ROSTER: [(u64, &str, &str, Division); 30] = [
    (1, "Atlanta Hawks", "ATL", Division::Southeast),
    (2, "Boston Celtics", "BOS", Division::Atlantic),
    (3, "Brooklyn Nets", "BKN", Division::Atlantic),
    (4, "Charlotte Hornets", "CHA", Division::Southeast),
    (5, "Chicago Bulls", "CHI", Division::Central),
    (6, "Cleveland Cavaliers", "CLE", Division::Central),
    (7, "Dallas Mavericks", "DAL", Division::Southwest),
    (8, "Denver Nuggets", "DEN", Division::Northwest),
    (9, "Detroit Pistons", "DET", Division::Central),
    (10, "Golden State Warriors", "GSW", Division::Pacific),
    (11, "Houston Rockets", "HOU", Division::Southwest),
    (12, "Indiana Pacers", "IND", Division::Central),
    (13, "LA Clippers", "LAC", Division::Pacific),
    (14, "Los Angeles Lakers", "LAL", Division::Pacific),
    (15, "Memphis Grizzlies", "MEM", Division::Southwest),
    (16, "Miami Heat", "MIA", Division::Southeast),
    (17, "Milwaukee Bucks", "MIL", Division::Central),
    (18, "Minnesota Timberwolves", "MIN", Division::Northwest),
    (19, "New Orleans Pelicans", "NOP", Division::Southwest),
    (20, "New York Knicks", "NYK", Division::Atlantic),
    (21, "Oklahoma City Thunder", "OKC", Division::Northwest),
    (22, "Orlando Magic", "ORL", Division::Southeast),
    (23, "Philadelphia 76ers", "PHI", Division::Atlantic),
    (24, "Phoenix Suns", "PHX", Division::Pacific),
    (25, "Portland Trail Blazers", "POR", Division::Northwest),
    (26, "Sacramento Kings", "SAC", Division::Pacific),
    (27, "San Antonio Spurs", "SAS", Division::Southwest),
    (28, "Toronto Raptors", "TOR", Division::Atlantic),
    (29, "Utah Jazz", "UTA", Division::Northwest),
    (30, "Washington Wizards", "WAS", Division::Southeast),
];

/// The 30-team roster used to seed a fresh data directory.
pub fn default_roster() -> Vec<Team> {
    ROSTER
        .iter()
        .enumerate()
        .map(|(i, (upstream_id, name, abbreviation, division))| {
            Team::new((i + 1) as u32, *upstream_id, *name, *abbreviation, *division)
        })
        .collect()
}
