use std::sync::Arc;

use crate::analyzers::Forecaster;
use crate::config::Settings;
use crate::models::{StateBoundaries, UvDataset};

/// Read-only data shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<UvDataset>,
    pub boundaries: Arc<StateBoundaries>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(dataset: UvDataset, boundaries: StateBoundaries, settings: Settings) -> Self {
        Self {
            dataset: Arc::new(dataset),
            boundaries: Arc::new(boundaries),
            settings: Arc::new(settings),
        }
    }

    pub fn forecaster(&self) -> Forecaster {
        Forecaster::new().with_interval_width(self.settings.forecast.interval_width)
    }

    /// The requested horizon, or the configured default.
    pub fn forecast_days(&self, requested: Option<u32>) -> Option<u32> {
        requested.or(Some(self.settings.forecast.default_days))
    }
}
