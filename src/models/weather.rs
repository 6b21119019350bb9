//! Hourly weather series and the reading resolved from it

use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Hourly variables requested from the API, in request order
pub const HOURLY_VARIABLES: &str = "temperature_2m,weathercode,windspeed_10m,relativehumidity_2m";

/// Index-aligned hourly samples for a requested day range.
///
/// Samples are optional because the API reports gaps as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    /// Local ISO-8601 timestamps, e.g. `2024-01-01T12:00`
    pub time: Vec<String>,
    /// Temperature in Celsius
    #[serde(rename = "temperature_2m", default)]
    pub temperature: Vec<Option<f64>>,
    /// WMO weather code
    #[serde(rename = "weathercode", default)]
    pub weather_code: Vec<Option<i32>>,
    /// Wind speed in km/h
    #[serde(rename = "windspeed_10m", default)]
    pub wind_speed: Vec<Option<f64>>,
    /// Relative humidity in percent
    #[serde(rename = "relativehumidity_2m", default)]
    pub humidity: Vec<Option<i32>>,
}

impl HourlySeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// All value sequences have the same length as `time`
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        let len = self.time.len();
        self.temperature.len() == len
            && self.weather_code.len() == len
            && self.wind_speed.len() == len
            && self.humidity.len() == len
    }

    #[must_use]
    pub fn temperature_at(&self, index: usize) -> f64 {
        sample(&self.temperature, index)
    }

    #[must_use]
    pub fn weather_code_at(&self, index: usize) -> i32 {
        sample(&self.weather_code, index)
    }

    #[must_use]
    pub fn wind_speed_at(&self, index: usize) -> f64 {
        sample(&self.wind_speed, index)
    }

    #[must_use]
    pub fn humidity_at(&self, index: usize) -> i32 {
        sample(&self.humidity, index)
    }
}

// Missing or null samples fall back to the type's zero value.
fn sample<T: Copy + Default>(values: &[Option<T>], index: usize) -> T {
    values.get(index).copied().flatten().unwrap_or_default()
}

/// Weather for one requested date and time at one coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// The requested date and time, not the sample's own timestamp
    pub timestamp: NaiveDateTime,
    /// Temperature in Celsius
    pub temperature: f64,
    /// WMO weather code
    pub weather_code: i32,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Relative humidity in percent
    pub humidity: i32,
    /// Where the query was made
    pub coordinate: Coordinate,
}

impl WeatherReading {
    #[must_use]
    pub fn description(&self) -> &'static str {
        weather_code_to_description(self.weather_code)
    }

    #[must_use]
    pub fn icon(&self) -> &'static str {
        weather_code_to_icon(self.weather_code)
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format_temperature(self.temperature)
    }

    /// Format wind speed with unit
    #[must_use]
    pub fn format_wind(&self) -> String {
        format_wind(self.wind_speed)
    }

    #[must_use]
    pub fn format_humidity(&self) -> String {
        format!("{}%", self.humidity)
    }
}

impl Display for WeatherReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} {}  {}",
            self.icon(),
            self.description(),
            self.timestamp.format("%d.%m.%Y %H:%M")
        )?;
        writeln!(f, "   🌡️ {}", self.format_temperature())?;
        writeln!(f, "   💨 {}", self.format_wind())?;
        writeln!(f, "   💧 {}", self.format_humidity())?;
        write!(f, "   📍 {}", self.coordinate.format_coordinates())
    }
}

/// Temperature truncated to whole degrees, e.g. `20°C`
#[must_use]
pub fn format_temperature(celsius: f64) -> String {
    format!("{}°C", celsius.trunc() as i64)
}

/// Wind speed truncated to whole km/h
#[must_use]
pub fn format_wind(km_per_hour: f64) -> String {
    format!("{} km/h", km_per_hour.trunc() as i64)
}

/// Convert a WMO weather code to the stored human-readable description
#[must_use]
pub fn weather_code_to_description(code: i32) -> &'static str {
    match code {
        0 => "Ясно",
        1 => "Преимущественно ясно",
        2 => "Переменная облачность",
        3 => "Пасмурно",
        45 | 48 => "Туман",
        51 | 53 | 55 => "Морось",
        61 | 63 | 65 => "Дождь",
        66 | 67 => "Ледяной дождь",
        71 | 73 | 75 => "Снег",
        77 => "Снежные зерна",
        80..=82 => "Ливень",
        85 | 86 => "Снегопад",
        95 => "Гроза",
        96 | 99 => "Гроза с градом",
        _ => "Неизвестно",
    }
}

/// Convert a WMO weather code to a display icon
#[must_use]
pub fn weather_code_to_icon(code: i32) -> &'static str {
    match code {
        0 => "☀️",
        1 | 2 => "⛅",
        3 => "☁️",
        45 | 48 => "🌫️",
        51 | 53 | 55 | 61 | 63 | 65 => "🌧️",
        66 | 67 => "🌧️❄️",
        71 | 73 | 75 => "❄️",
        77 | 85 | 86 => "🌨️",
        80..=82 | 95 => "⛈️",
        96 | 99 => "⛈️🌨️",
        _ => "🌈",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case(0, "Ясно", "☀️")]
    #[case(1, "Преимущественно ясно", "⛅")]
    #[case(2, "Переменная облачность", "⛅")]
    #[case(3, "Пасмурно", "☁️")]
    #[case(45, "Туман", "🌫️")]
    #[case(48, "Туман", "🌫️")]
    #[case(53, "Морось", "🌧️")]
    #[case(65, "Дождь", "🌧️")]
    #[case(66, "Ледяной дождь", "🌧️❄️")]
    #[case(73, "Снег", "❄️")]
    #[case(77, "Снежные зерна", "🌨️")]
    #[case(81, "Ливень", "⛈️")]
    #[case(86, "Снегопад", "🌨️")]
    #[case(95, "Гроза", "⛈️")]
    #[case(99, "Гроза с градом", "⛈️🌨️")]
    fn test_weather_code_table(
        #[case] code: i32,
        #[case] description: &str,
        #[case] icon: &str,
    ) {
        assert_eq!(weather_code_to_description(code), description);
        assert_eq!(weather_code_to_icon(code), icon);
    }

    #[rstest]
    #[case(i32::MIN)]
    #[case(-1)]
    #[case(4)]
    #[case(47)]
    #[case(52)]
    #[case(97)]
    #[case(100)]
    #[case(i32::MAX)]
    fn test_unknown_codes_fall_back(#[case] code: i32) {
        assert_eq!(weather_code_to_description(code), "Неизвестно");
        assert_eq!(weather_code_to_icon(code), "🌈");
    }

    #[test]
    fn test_mapping_is_total_over_small_range() {
        for code in -200..=200 {
            assert!(!weather_code_to_description(code).is_empty());
            assert!(!weather_code_to_icon(code).is_empty());
        }
    }

    #[test]
    fn test_series_sampling_defaults() {
        let series = HourlySeries {
            time: vec!["2024-01-01T00:00".into(), "2024-01-01T01:00".into()],
            temperature: vec![Some(-3.5), None],
            weather_code: vec![Some(71)],
            wind_speed: vec![Some(12.0), Some(14.0)],
            humidity: vec![],
        };

        assert!(!series.is_aligned());
        assert_eq!(series.temperature_at(0), -3.5);
        assert_eq!(series.temperature_at(1), 0.0);
        assert_eq!(series.weather_code_at(1), 0);
        assert_eq!(series.wind_speed_at(1), 14.0);
        assert_eq!(series.humidity_at(0), 0);
    }

    #[test]
    fn test_series_deserializes_nulls() {
        let json = r#"{
            "time": ["2024-01-01T00:00", "2024-01-01T01:00"],
            "temperature_2m": [1.5, null],
            "weathercode": [3, 61],
            "windspeed_10m": [null, 7.2],
            "relativehumidity_2m": [80, 82]
        }"#;

        let series: HourlySeries = serde_json::from_str(json).unwrap();
        assert!(series.is_aligned());
        assert_eq!(series.len(), 2);
        assert_eq!(series.temperature, vec![Some(1.5), None]);
        assert_eq!(series.wind_speed_at(0), 0.0);
        assert_eq!(series.humidity_at(1), 82);
    }

    #[test]
    fn test_reading_formatting() {
        let reading = WeatherReading {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            temperature: -2.7,
            weather_code: 71,
            wind_speed: 15.9,
            humidity: 88,
            coordinate: Coordinate::new(59.9386, 30.3141),
        };

        assert_eq!(reading.description(), "Снег");
        assert_eq!(reading.format_temperature(), "-2°C");
        assert_eq!(reading.format_wind(), "15 km/h");
        assert_eq!(reading.format_humidity(), "88%");

        let text = reading.to_string();
        assert!(text.contains("05.03.2024 09:00"));
        assert!(text.contains("59.9386, 30.3141"));
    }
}
