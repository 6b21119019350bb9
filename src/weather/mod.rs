use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Coordinate, HourlySeries};

pub mod open_meteo;
pub mod query;
pub mod resolver;

pub use open_meteo::OpenMeteoClient;
pub use query::WeatherQueryService;
pub use resolver::TimeSlotResolver;

/// Source of hourly weather samples
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Hourly series for `start..=end` (local dates at the coordinate)
    async fn hourly_series(
        &self,
        coordinate: &Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HourlySeries>;
}
