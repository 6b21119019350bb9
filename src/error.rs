//! Error types and handling for the weather timeline

use thiserror::Error;

/// Main error type for the weather timeline
#[derive(Error, Debug)]
pub enum WeatherTimelineError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// No usable location could be obtained from the provider
    #[error("Location unavailable: {message}")]
    LocationUnavailable { message: String },

    /// Coordinate outside the valid latitude/longitude range
    #[error("Invalid coordinate: lat={latitude}, lon={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Weather API communication, decoding or server errors
    #[error("Weather query failed: {message}")]
    Query { message: String },

    /// History store errors
    #[error("History store error: {message}")]
    Persistence { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherTimelineError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new location error
    pub fn location_unavailable<S: Into<String>>(message: S) -> Self {
        Self::LocationUnavailable {
            message: message.into(),
        }
    }

    /// Create a new invalid coordinate error
    #[must_use]
    pub fn invalid_coordinate(latitude: f64, longitude: f64) -> Self {
        Self::InvalidCoordinate {
            latitude,
            longitude,
        }
    }

    /// Wrap a transport or decoding failure, keeping the whole cause chain
    #[must_use]
    pub fn query(source: &anyhow::Error) -> Self {
        Self::Query {
            message: format!("{source:#}"),
        }
    }

    /// Wrap a history store failure, keeping the whole cause chain
    #[must_use]
    pub fn persistence(source: &anyhow::Error) -> Self {
        Self::Persistence {
            message: format!("{source:#}"),
        }
    }

    /// Whether repeating the same operation may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Query { .. } | Self::LocationUnavailable { .. } | Self::Persistence { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherTimelineError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            WeatherTimelineError::LocationUnavailable { .. } => {
                "Determining your location... Please try again in a few seconds.".to_string()
            }
            WeatherTimelineError::InvalidCoordinate {
                latitude,
                longitude,
            } => {
                format!("Coordinates {latitude:.4}, {longitude:.4} are out of range")
            }
            WeatherTimelineError::Query { message } => {
                format!("Failed to get weather data: {message}")
            }
            WeatherTimelineError::Persistence { message } => {
                format!("History operation failed: {message}")
            }
            WeatherTimelineError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_creation() {
        let config_err = WeatherTimelineError::config("bad level");
        assert!(matches!(config_err, WeatherTimelineError::Config { .. }));

        let location_err = WeatherTimelineError::location_unavailable("no fix");
        assert!(matches!(
            location_err,
            WeatherTimelineError::LocationUnavailable { .. }
        ));

        let coord_err = WeatherTimelineError::invalid_coordinate(91.0, 0.0);
        assert!(matches!(
            coord_err,
            WeatherTimelineError::InvalidCoordinate { .. }
        ));
    }

    #[test]
    fn test_query_error_keeps_cause_chain() {
        let cause: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused"));
        let err = cause.context("Failed to send request").unwrap_err();

        let query_err = WeatherTimelineError::query(&err);
        let text = query_err.to_string();
        assert!(text.contains("Failed to send request"));
        assert!(text.contains("connection refused"));
        assert!(query_err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let config_err = WeatherTimelineError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));
        assert!(!config_err.is_retryable());

        let coord_err = WeatherTimelineError::invalid_coordinate(120.0, 10.0);
        assert!(coord_err.user_message().contains("120.0000"));
        assert!(!coord_err.is_retryable());

        let store_err = WeatherTimelineError::persistence(&anyhow::anyhow!("disk full"));
        assert!(store_err.user_message().contains("disk full"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WeatherTimelineError = io_err.into();
        assert!(matches!(err, WeatherTimelineError::Io { .. }));
    }
}
