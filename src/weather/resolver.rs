//! Maps a requested date and time onto one sample of an hourly series

use chrono::{NaiveDate, NaiveTime, Timelike};
use tracing::warn;

use crate::models::HourlySeries;

/// Target time used when the caller gives none
pub const DEFAULT_TARGET_TIME: NaiveTime = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

/// Finds the sample for a target hour.
///
/// Matching is done on the `YYYY-MM-DDTHH` prefix of the series timestamps, so
/// minutes and seconds of the target are ignored. When nothing matches the
/// first sample (index 0) is used: lookups are best effort and never fail here.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSlotResolver;

impl TimeSlotResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Index of the first sample in the target hour, or 0
    #[must_use]
    pub fn resolve(
        &self,
        series: &HourlySeries,
        target_date: NaiveDate,
        target_time: Option<NaiveTime>,
    ) -> usize {
        let prefix = hour_prefix(target_date, effective_time(target_time));

        match series.time.iter().position(|time| time.starts_with(&prefix)) {
            Some(index) => index,
            None => {
                warn!(
                    "No sample for {} among {} entries, using the first one",
                    prefix,
                    series.len()
                );
                0
            }
        }
    }
}

/// The requested time, or noon
#[must_use]
pub fn effective_time(target_time: Option<NaiveTime>) -> NaiveTime {
    target_time.unwrap_or(DEFAULT_TARGET_TIME)
}

fn hour_prefix(date: NaiveDate, time: NaiveTime) -> String {
    format!("{}T{:02}", date.format("%Y-%m-%d"), time.hour())
}
