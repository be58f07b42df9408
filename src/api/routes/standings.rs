use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::GroupBy;
use crate::season::validate_requested_date;
use crate::standings::GroupedStandings;

#[derive(Debug, Deserialize)]
pub struct StandingsParams {
    pub date: Option<String>,
    #[serde(rename = "groupBy")]
    pub group_by: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    pub date: NaiveDate,
    pub group_by: GroupBy,
    pub standings: GroupedStandings,
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing required parameter '{}'", name)))
}

pub async fn get_standings(
    State(state): State<AppState>,
    Query(params): Query<StandingsParams>,
) -> Result<Json<StandingsResponse>, ApiError> {
    let raw_date = required(params.date.as_deref(), "date")?;
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!(
            "Invalid value '{}' for parameter 'date'. Expected YYYY-MM-DD",
            raw_date
        ))
    })?;
    let group_by: GroupBy = required(params.group_by.as_deref(), "groupBy")?.parse()?;

    validate_requested_date(date, state.today(), &state.season)?;

    let standings = state.service.get_standings(date, group_by).await?;

    Ok(Json(StandingsResponse {
        date,
        group_by,
        standings,
    }))
}
