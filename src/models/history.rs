//! Persisted weather lookups

use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::coordinate::{format_coordinates, format_hemispheres};
use super::weather::{format_temperature, format_wind, weather_code_to_icon};

/// A lookup that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the lookup happened (local wall-clock time)
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    /// Temperature in Celsius
    pub temperature: f64,
    pub weather_code: i32,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Relative humidity in percent
    pub humidity: i32,
    pub weather_description: String,
    pub location_label: Option<String>,
    pub was_current_location: bool,
}

/// A stored lookup, identified by the id the store assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub weather_code: i32,
    pub wind_speed: f64,
    pub humidity: i32,
    pub weather_description: String,
    pub location_label: Option<String>,
    pub was_current_location: bool,
}

impl HistoryEntry {
    /// Attach a store-assigned id
    #[must_use]
    pub fn into_record(self, id: u64) -> HistoryRecord {
        HistoryRecord {
            id,
            timestamp: self.timestamp,
            latitude: self.latitude,
            longitude: self.longitude,
            temperature: self.temperature,
            weather_code: self.weather_code,
            wind_speed: self.wind_speed,
            humidity: self.humidity,
            weather_description: self.weather_description,
            location_label: self.location_label,
            was_current_location: self.was_current_location,
        }
    }
}

impl HistoryRecord {
    #[must_use]
    pub fn format_date_time(&self) -> String {
        self.timestamp.format("%d.%m.%Y %H:%M").to_string()
    }

    #[must_use]
    pub fn format_date(&self) -> String {
        self.timestamp.format("%d.%m.%Y").to_string()
    }

    #[must_use]
    pub fn format_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }

    #[must_use]
    pub fn format_temperature(&self) -> String {
        format_temperature(self.temperature)
    }

    #[must_use]
    pub fn format_wind(&self) -> String {
        format_wind(self.wind_speed)
    }

    #[must_use]
    pub fn format_humidity(&self) -> String {
        format!("{}%", self.humidity)
    }

    /// Label shown for the place of the lookup
    #[must_use]
    pub fn display_location(&self) -> String {
        if let Some(label) = &self.location_label {
            label.clone()
        } else if self.was_current_location {
            "Current location".to_string()
        } else {
            format_coordinates(self.latitude, self.longitude)
        }
    }

    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format_hemispheres(self.latitude, self.longitude)
    }

    /// Case-insensitive substring match on the stored description
    #[must_use]
    pub fn description_contains(&self, needle: &str) -> bool {
        self.weather_description
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }
}

impl Display for HistoryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "#{} {}  {} {}",
            self.id,
            self.format_date_time(),
            weather_code_to_icon(self.weather_code),
            self.weather_description
        )?;
        writeln!(
            f,
            "   🌡️ {}  💨 {}  💧 {}",
            self.format_temperature(),
            self.format_wind(),
            self.format_humidity()
        )?;
        write!(
            f,
            "   📍 {} ({})",
            self.display_location(),
            self.format_coordinates()
        )
    }
}
