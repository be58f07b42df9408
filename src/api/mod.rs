//! REST API endpoints.
//!
//! Axum-based HTTP API serving standings by date.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::ingest::IngestError;
use crate::models::ParseGroupingError;
use crate::season::DateValidationError;
use crate::standings::StandingsError;
use crate::storage::StorageError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            error!(code, message = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<DateValidationError> for ApiError {
    fn from(err: DateValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ParseGroupingError> for ApiError {
    fn from(err: ParseGroupingError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<StandingsError> for ApiError {
    fn from(err: StandingsError) -> Self {
        match err {
            StandingsError::Ingest(IngestError::Fetch(e)) => {
                ApiError::Upstream(format!("Failed to fetch games from upstream: {}", e))
            }
            StandingsError::Storage(e @ StorageError::DuplicateSnapshot { .. })
            | StandingsError::Ingest(IngestError::Storage(e @ StorageError::DuplicateSnapshot { .. })) => {
                warn!(error = %e, "Concurrent snapshot computation");
                ApiError::Conflict(e.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = match state.cors_origin.as_deref() {
        None | Some("*") => CorsLayer::new().allow_origin(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => CorsLayer::new().allow_origin(value),
            Err(_) => {
                warn!(origin, "Invalid CORS origin, allowing any");
                CorsLayer::new().allow_origin(Any)
            }
        },
    }
    .allow_methods(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/standings", get(routes::standings::get_standings))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
