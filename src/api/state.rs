use std::sync::Arc;

use chrono::NaiveDate;

use crate::season::SeasonConfig;
use crate::standings::StandingsService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StandingsService>,
    pub season: SeasonConfig,
    pub cors_origin: Option<String>,
    /// Fixed "today" for date validation; the local date when unset.
    pub today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(service: Arc<StandingsService>) -> Self {
        let season = *service.season();
        Self {
            service,
            season,
            cors_origin: None,
            today: None,
        }
    }

    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = Some(origin.into());
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
