//! Weather API client for `OpenMeteo`
//!
//! Retries of transient failures and the request timeout live in the HTTP
//! transport (`reqwest-middleware` + `reqwest-retry`), not in callers.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::WeatherApi;
use crate::config::WeatherConfig;
use crate::models::{Coordinate, HOURLY_VARIABLES, HourlySeries};

const USER_AGENT: &str = concat!("weather-timeline/", env!("CARGO_PKG_VERSION"));

/// Forecast response from `OpenMeteo`
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub hourly: HourlySeries,
    #[serde(default)]
    pub hourly_units: HashMap<String, String>,
}

/// HTTP client for the `forecast` resource
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: ClientWithMiddleware,
    forecast_url: String,
}

impl OpenMeteoClient {
    /// Create a client with timeout and retry policy from `config`
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let http = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            http,
            forecast_url: format!("{}/forecast", config.base_url.trim_end_matches('/')),
        })
    }

    /// Full request URL for a single coordinate and date range
    pub fn forecast_url(
        &self,
        coordinate: &Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Url> {
        let start_date = start.format("%Y-%m-%d").to_string();
        let end_date = end.format("%Y-%m-%d").to_string();
        Url::parse_with_params(
            &self.forecast_url,
            &[
                ("latitude", coordinate.latitude.to_string()),
                ("longitude", coordinate.longitude.to_string()),
                ("start_date", start_date),
                ("end_date", end_date),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("timezone", "auto".to_string()),
            ],
        )
        .with_context(|| format!("Invalid weather API URL: {}", self.forecast_url))
    }
}

#[async_trait]
impl WeatherApi for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    async fn hourly_series(
        &self,
        coordinate: &Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HourlySeries> {
        let url = self.forecast_url(coordinate, start, end)?;
        debug!("OpenMeteo API request URL: {}", url);

        let start_time = Instant::now();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to send request to OpenMeteo")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read OpenMeteo response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenMeteo request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: ForecastResponse =
            serde_json::from_str(&body).context("Failed to parse OpenMeteo forecast JSON")?;

        let total_duration = start_time.elapsed();
        info!(
            "Retrieved {} hourly samples in {:.3}s",
            parsed.hourly.len(),
            total_duration.as_secs_f64()
        );
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow forecast API response: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(parsed.hourly)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
