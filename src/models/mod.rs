//! Data models for the weather timeline
//!
//! This module contains the core domain models organized by concern:
//! - Coordinate: Geographic position reported by a location provider
//! - Weather: Hourly series from the API and the resolved reading
//! - History: Persisted lookups

pub mod coordinate;
pub mod history;
pub mod weather;

// Re-export all public types for convenient access
pub use coordinate::Coordinate;
pub use history::{HistoryEntry, HistoryRecord};
pub use weather::{
    HOURLY_VARIABLES, HourlySeries, WeatherReading, weather_code_to_description,
    weather_code_to_icon,
};
