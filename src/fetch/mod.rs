//! Upstream game-results fetching.
//!
//! Pulls completed and in-progress games for a date range from a paginated
//! HTTP games API. Pages are followed by cursor until the API stops returning
//! one. Failures are never retried so upstream rate limits are respected.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Status string the upstream API uses for finished games.
pub const STATUS_FINAL: &str = "Final";

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Team reference embedded in an upstream game.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamTeam {
    pub id: u64,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub conference: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
}

/// A game record as returned by the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamGame {
    pub id: u64,

    #[serde(deserialize_with = "deserialize_game_date")]
    pub date: NaiveDate,

    #[serde(default)]
    pub status: String,

    pub home_team: UpstreamTeam,
    pub visitor_team: UpstreamTeam,

    #[serde(default)]
    pub home_team_score: u32,

    #[serde(default)]
    pub visitor_team_score: u32,
}

impl UpstreamGame {
    /// Only games whose status is exactly "Final" count.
    pub fn is_final(&self) -> bool {
        self.status == STATUS_FINAL
    }
}

/// Accept `2024-10-22` as well as timestamps like `2024-10-22T00:00:00.000Z`.
fn deserialize_game_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

/// Pagination metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub next_cursor: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// One page of the games listing.
#[derive(Debug, Clone, Deserialize)]
pub struct GamesPage {
    #[serde(default)]
    pub data: Vec<UpstreamGame>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

impl GamesPage {
    pub fn next_cursor(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|m| m.next_cursor)
    }
}

/// Source of upstream game records.
///
/// Implementations return every game in `[start, end]` across all pages,
/// final or not; filtering is up to the caller.
#[async_trait]
pub trait GameSource: Send + Sync {
    async fn fetch_games(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<UpstreamGame>, FetchError>;
}

/// Configuration for the games API client.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// API base URL, e.g. `https://api.balldontlie.io/v1`
    pub base_url: String,

    /// Sent as the `Authorization` header when present
    pub api_key: Option<String>,

    /// Results per page
    pub per_page: u32,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.balldontlie.io/v1".to_string(),
            api_key: None,
            per_page: 100,
            timeout: Duration::from_secs(30),
            user_agent: concat!("league-standings/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP client for the paginated games endpoint.
pub struct GamesApiClient {
    client: Client,
    base_url: Url,
    per_page: u32,
}

impl GamesApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("league-standings")),
        );
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|e| FetchError::InvalidUrl(format!("Bad API key header: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            per_page: config.per_page,
        })
    }

    /// Build the URL for one page of games.
    pub fn games_url(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        cursor: Option<u64>,
    ) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/games", self.base_url.as_str().trim_end_matches('/')))
            .map_err(|e| FetchError::InvalidUrl(format!("Bad games URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("start_date", &start.format("%Y-%m-%d").to_string())
                .append_pair("end_date", &end.format("%Y-%m-%d").to_string())
                .append_pair("per_page", &self.per_page.to_string())
                .append_pair("postseason", "false");
            if let Some(cursor) = cursor {
                query.append_pair("cursor", &cursor.to_string());
            }
        }
        Ok(url)
    }

    /// Fetch and decode a single page.
    pub async fn fetch_page(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        cursor: Option<u64>,
    ) -> Result<GamesPage, FetchError> {
        let url = self.games_url(start, end, cursor)?;
        debug!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl GameSource for GamesApiClient {
    async fn fetch_games(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<UpstreamGame>, FetchError> {
        info!(%start, %end, "Fetching games from upstream");

        let mut games = Vec::new();
        let mut cursor = None;
        let mut pages = 0u32;

        loop {
            let page = self.fetch_page(start, end, cursor).await?;
            pages += 1;
            let next = page.next_cursor();
            games.extend(page.data);

            match next {
                Some(next) if Some(next) != cursor => cursor = Some(next),
                _ => break,
            }
        }

        info!(pages, games = games.len(), "Received games from upstream");
        Ok(games)
    }
}
