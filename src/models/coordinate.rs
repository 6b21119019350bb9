//! Coordinate model for positions reported by a location provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::WeatherTimelineError;

/// A single position fix
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Horizontal accuracy in meters
    pub accuracy: f32,
    /// When the fix was taken
    pub captured_at: DateTime<Utc>,
}

impl Coordinate {
    /// Create a coordinate captured now with unknown accuracy
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: 0.0,
            captured_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.accuracy = accuracy;
        self
    }

    #[must_use]
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]; NaN is never valid
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Return the coordinate if it is usable for a query
    pub fn validate(self) -> crate::Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(WeatherTimelineError::invalid_coordinate(
                self.latitude,
                self.longitude,
            ))
        }
    }

    /// Whether this fix was taken after `other`
    #[must_use]
    pub fn is_fresher_than(&self, other: &Coordinate) -> bool {
        self.captured_at > other.captured_at
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format_coordinates(self.latitude, self.longitude)
    }
}

/// Plain `lat, lon` with four decimals
#[must_use]
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.4}, {longitude:.4}")
}

/// Absolute values with hemisphere letters, e.g. `55.7558° N, 37.6173° E`
#[must_use]
pub fn format_hemispheres(latitude: f64, longitude: f64) -> String {
    let lat_direction = if latitude >= 0.0 { "N" } else { "S" };
    let lon_direction = if longitude >= 0.0 { "E" } else { "W" };
    format!(
        "{:.4}° {lat_direction}, {:.4}° {lon_direction}",
        latitude.abs(),
        longitude.abs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0, true)]
    #[case(90.0, 180.0, true)]
    #[case(-90.0, -180.0, true)]
    #[case(55.7558, 37.6173, true)]
    #[case(90.0001, 0.0, false)]
    #[case(-91.0, 0.0, false)]
    #[case(0.0, 180.5, false)]
    #[case(0.0, -181.0, false)]
    #[case(f64::NAN, 0.0, false)]
    #[case(0.0, f64::NAN, false)]
    fn test_coordinate_validity(#[case] lat: f64, #[case] lon: f64, #[case] valid: bool) {
        let coordinate = Coordinate::new(lat, lon);
        assert_eq!(coordinate.is_valid(), valid);
        assert_eq!(coordinate.validate().is_ok(), valid);
    }

    #[test]
    fn test_validate_reports_coordinate() {
        let err = Coordinate::new(100.0, 5.0).validate().unwrap_err();
        assert!(matches!(
            err,
            WeatherTimelineError::InvalidCoordinate { latitude, longitude }
                if latitude == 100.0 && longitude == 5.0
        ));
    }

    #[test]
    fn test_freshness() {
        let older = Coordinate::new(1.0, 1.0);
        let newer = older.with_captured_at(older.captured_at + Duration::seconds(10));
        assert!(newer.is_fresher_than(&older));
        assert!(!older.is_fresher_than(&newer));
        assert!(!older.is_fresher_than(&older));
    }

    #[test]
    fn test_formatting() {
        let coordinate = Coordinate::new(55.755_826, -37.617_3);
        assert_eq!(coordinate.format_coordinates(), "55.7558, -37.6173");
        assert_eq!(
            format_hemispheres(-33.868_8, 151.209_3),
            "33.8688° S, 151.2093° E"
        );
        assert_eq!(
            format_hemispheres(coordinate.latitude, coordinate.longitude),
            "55.7558° N, 37.6173° W"
        );
    }
}
