//! Fetch-and-persist of upstream game results.
//!
//! Pulls a date window from a [`GameSource`], keeps only final games for
//! known teams that are not already stored, and appends them in one batch.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::fetch::{FetchError, GameSource, UpstreamGame};
use crate::models::{GameResult, TeamId};
use crate::storage::{LeagueStore, StorageError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Upstream fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Counts from one ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub received: usize,
    pub stored: usize,
    pub skipped_existing: usize,
    pub skipped_not_final: usize,
    pub skipped_unknown_team: usize,
}

/// Fetch games in `[start, end]` and store the new final ones.
pub async fn fetch_and_store_games(
    source: &dyn GameSource,
    store: &dyn LeagueStore,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<IngestSummary, IngestError> {
    let upstream = source.fetch_games(start, end).await?;

    let team_ids: HashMap<u64, TeamId> = store
        .teams()?
        .into_iter()
        .map(|t| (t.upstream_id, t.id))
        .collect();

    let mut summary = IngestSummary {
        received: upstream.len(),
        ..Default::default()
    };

    let mut candidates = Vec::with_capacity(upstream.len());
    for game in &upstream {
        if !game.is_final() {
            summary.skipped_not_final += 1;
            continue;
        }
        match to_game_result(game, &team_ids) {
            Some(result) => candidates.push(result),
            None => {
                warn!(
                    game_id = game.id,
                    home_team = game.home_team.id,
                    visitor_team = game.visitor_team.id,
                    "Upstream game references an unknown team, skipping"
                );
                summary.skipped_unknown_team += 1;
            }
        }
    }

    summary.stored = store.append_games(&candidates)?;
    summary.skipped_existing = candidates.len() - summary.stored;

    info!(
        %start,
        %end,
        received = summary.received,
        stored = summary.stored,
        skipped_existing = summary.skipped_existing,
        skipped_not_final = summary.skipped_not_final,
        skipped_unknown_team = summary.skipped_unknown_team,
        "Ingested upstream games"
    );

    Ok(summary)
}

fn to_game_result(game: &UpstreamGame, team_ids: &HashMap<u64, TeamId>) -> Option<GameResult> {
    let home = *team_ids.get(&game.home_team.id)?;
    let away = *team_ids.get(&game.visitor_team.id)?;
    Some(GameResult::new(
        game.id,
        game.date,
        home,
        away,
        game.home_team_score,
        game.visitor_team_score,
    ))
}
