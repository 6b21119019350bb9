//! Weather timeline - look up the weather for any date and time at the current
//! location, and keep a browsable history of past lookups.

pub mod config;
pub mod error;
pub mod history;
pub mod location;
pub mod models;
pub mod session;
pub mod telemetry;
pub mod weather;

// Re-export core types for public API
pub use config::AppConfig;
pub use error::WeatherTimelineError;
pub use history::{HistoryService, HistoryStore};
pub use location::{
    FixedLocationProvider, LocationFeed, LocationProvider, LocationState, LocationSubscription,
};
pub use models::{Coordinate, HistoryEntry, HistoryRecord, HourlySeries, WeatherReading};
pub use session::{FetchSequencer, LookupOutcome, WeatherSession};
pub use weather::{OpenMeteoClient, TimeSlotResolver, WeatherApi, WeatherQueryService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherTimelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
