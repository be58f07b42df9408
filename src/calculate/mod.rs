//! Standings calculation engine.
//!
//! Pure functions over an in-memory roster and game list:
//! - Win/loss tallies and winning percentage per team
//! - Division ranks and conference ranks, each computed independently
//! - Composition of the two into ranked standings

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::models::{standing_order, GameResult, Team, TeamId, TeamStanding};

/// Team id to 1-based rank within its group.
pub type RankMap = HashMap<TeamId, u32>;

/// Tally wins and losses for every team on the roster.
///
/// Every roster team appears in the result, including teams with no games.
/// Games referencing a team outside the roster are skipped with a warning.
/// The result does not depend on the order of `games`.
pub fn compute_records(games: &[GameResult], teams: &[Team]) -> BTreeMap<TeamId, TeamStanding> {
    let mut tallies: BTreeMap<TeamId, (u32, u32)> =
        teams.iter().map(|t| (t.id, (0, 0))).collect();

    for game in games {
        if !tallies.contains_key(&game.home_team) || !tallies.contains_key(&game.away_team) {
            warn!(
                game_id = game.external_id,
                home_team = %game.home_team,
                away_team = %game.away_team,
                "Game references a team missing from the roster, skipping"
            );
            continue;
        }

        let (winner, loser) = game.winner_and_loser();
        if let Some(tally) = tallies.get_mut(&winner) {
            tally.0 += 1;
        }
        if let Some(tally) = tallies.get_mut(&loser) {
            tally.1 += 1;
        }
    }

    teams
        .iter()
        .map(|team| {
            let (wins, losses) = tallies.get(&team.id).copied().unwrap_or_default();
            (team.id, TeamStanding::with_record(team.clone(), wins, losses))
        })
        .collect()
}

/// Rank teams within each division.
pub fn assign_division_ranks(standings: &BTreeMap<TeamId, TeamStanding>) -> RankMap {
    rank_within_groups(standings, |s| s.team.division)
}

/// Rank teams within each conference.
pub fn assign_conference_ranks(standings: &BTreeMap<TeamId, TeamStanding>) -> RankMap {
    rank_within_groups(standings, |s| s.team.conference())
}

/// Group standings by `key`, sort each group by the natural order and number
/// it from 1. The name tiebreak makes the order total, so ranks never repeat.
fn rank_within_groups<K, F>(standings: &BTreeMap<TeamId, TeamStanding>, key: F) -> RankMap
where
    K: Ord,
    F: Fn(&TeamStanding) -> K,
{
    let mut groups: BTreeMap<K, Vec<&TeamStanding>> = BTreeMap::new();
    for standing in standings.values() {
        groups.entry(key(standing)).or_default().push(standing);
    }

    let mut ranks = RankMap::with_capacity(standings.len());
    for members in groups.values_mut() {
        members.sort_by(|a, b| standing_order(a, b));
        for (i, standing) in members.iter().enumerate() {
            ranks.insert(standing.team.id, (i + 1) as u32);
        }
    }
    ranks
}

/// Combine records with both rank maps into ranked standings.
///
/// Output is in natural standings order across the whole league.
pub fn apply_ranks(
    standings: &BTreeMap<TeamId, TeamStanding>,
    division_ranks: &RankMap,
    conference_ranks: &RankMap,
) -> Vec<TeamStanding> {
    let mut ranked: Vec<TeamStanding> = standings
        .values()
        .map(|s| {
            let division_rank = division_ranks.get(&s.team.id).copied().unwrap_or(0);
            let conference_rank = conference_ranks.get(&s.team.id).copied().unwrap_or(0);
            s.with_ranks(division_rank, conference_rank)
        })
        .collect();
    sort_standings(&mut ranked);
    ranked
}

/// Compute fully ranked standings from games and roster.
pub fn rank_standings(games: &[GameResult], teams: &[Team]) -> Vec<TeamStanding> {
    let records = compute_records(games, teams);
    let division_ranks = assign_division_ranks(&records);
    let conference_ranks = assign_conference_ranks(&records);
    apply_ranks(&records, &division_ranks, &conference_ranks)
}

/// Sort standings by win% desc, wins desc, name asc.
pub fn sort_standings(standings: &mut [TeamStanding]) {
    standings.sort_by(standing_order);
}
