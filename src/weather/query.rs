//! Single weather lookup: request, time-slot resolution, normalisation

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{info, instrument, warn};

use super::WeatherApi;
use super::resolver::{TimeSlotResolver, effective_time};
use crate::models::{Coordinate, WeatherReading};
use crate::{Result, WeatherTimelineError};

/// Fetches the reading for one coordinate, date and optional time
#[derive(Clone)]
pub struct WeatherQueryService {
    api: Arc<dyn WeatherApi>,
    resolver: TimeSlotResolver,
}

impl WeatherQueryService {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self {
            api,
            resolver: TimeSlotResolver::new(),
        }
    }

    /// Reading for `date` at `time` (noon when absent).
    ///
    /// Rejects invalid coordinates before any request is made. Samples missing
    /// at the resolved index are reported as zero.
    #[instrument(skip(self, coordinate), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    pub async fn fetch(
        &self,
        coordinate: &Coordinate,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Result<WeatherReading> {
        let coordinate = coordinate.validate()?;

        let series = self
            .api
            .hourly_series(&coordinate, date, date)
            .await
            .map_err(|e| WeatherTimelineError::query(&e))?;

        if series.is_empty() {
            warn!("Weather API returned no hourly samples for {}", date);
        } else if !series.is_aligned() {
            warn!(
                "Hourly series are not index-aligned ({} timestamps)",
                series.len()
            );
        }

        let target_time = effective_time(time);
        let index = self.resolver.resolve(&series, date, Some(target_time));

        let reading = WeatherReading {
            timestamp: date.and_time(target_time),
            temperature: series.temperature_at(index),
            weather_code: series.weather_code_at(index),
            wind_speed: series.wind_speed_at(index),
            humidity: series.humidity_at(index),
            coordinate,
        };

        info!(
            "Resolved {} to sample {} ({}, code {})",
            reading.timestamp,
            index,
            reading.format_temperature(),
            reading.weather_code
        );

        Ok(reading)
    }
}
