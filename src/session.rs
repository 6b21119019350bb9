//! Lookup session: location acquisition, gated weather lookups and history saving

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, NaiveTime};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::history::HistoryService;
use crate::location::{LocationProvider, LocationState};
use crate::models::{Coordinate, WeatherReading};
use crate::weather::WeatherQueryService;
use crate::{Result, WeatherTimelineError};

/// Hands out increasing tickets so that only the newest lookup is applied
#[derive(Debug, Default)]
pub struct FetchSequencer {
    latest: AtomicU64,
}

impl FetchSequencer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a new lookup; every earlier ticket becomes stale
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

/// Result of a lookup once it completes
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// The reading is current; carries the history id if it was saved
    Applied(WeatherReading, Option<u64>),
    /// A newer lookup was started before this one finished
    Superseded,
}

pub struct WeatherSession {
    query: WeatherQueryService,
    history: HistoryService,
    location: Arc<dyn LocationProvider>,
    state: watch::Sender<LocationState>,
    sequencer: FetchSequencer,
}

impl WeatherSession {
    pub fn new(
        query: WeatherQueryService,
        history: HistoryService,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        let (state, _) = watch::channel(LocationState::Idle);
        Self {
            query,
            history,
            location,
            state,
            sequencer: FetchSequencer::new(),
        }
    }

    #[must_use]
    pub fn location_state(&self) -> LocationState {
        self.state.borrow().clone()
    }

    /// Observe location state transitions
    #[must_use]
    pub fn watch_location_state(&self) -> watch::Receiver<LocationState> {
        self.state.subscribe()
    }

    /// Record the host's answer to a location permission request
    pub fn set_permission(&self, granted: bool) {
        self.state.send_replace(LocationState::from_permission(granted));
    }

    /// Ask the provider for a fresh fix, falling back to the last known one
    #[instrument(skip(self))]
    pub async fn refresh_location(&self) -> LocationState {
        if matches!(*self.state.borrow(), LocationState::PermissionDenied) {
            debug!("Location permission denied, not querying provider");
            return LocationState::PermissionDenied;
        }

        self.state.send_replace(LocationState::Loading);

        let fix = match self.location.current_location().await {
            Some(coordinate) => Some(coordinate),
            None => self.location.last_known_location().await,
        };

        let next = LocationState::from_fix(fix);
        match &next {
            LocationState::Success(coordinate) => {
                info!("Location acquired: {}", coordinate.format_coordinates())
            }
            LocationState::Error(message) => warn!("Location unavailable: {}", message),
            _ => {}
        }
        self.state.send_replace(next.clone());
        next
    }

    /// Look up the weather at the session's location.
    ///
    /// Uses the acquired location when there is one, then the provider's last
    /// known fix, then a fresh fix. With `save`, an applied reading is also
    /// written to history.
    #[instrument(skip(self))]
    pub async fn lookup(
        &self,
        date: NaiveDate,
        time: Option<NaiveTime>,
        save: bool,
    ) -> Result<LookupOutcome> {
        let ticket = self.sequencer.issue();
        let coordinate = self.usable_coordinate().await?;

        let fetched = self.query.fetch(&coordinate, date, time).await;
        if !self.sequencer.is_latest(ticket) {
            debug!("Dropping result of superseded lookup {}", ticket);
            return Ok(LookupOutcome::Superseded);
        }
        let reading = fetched?;

        let saved = if save {
            Some(self.history.save(&reading).await?)
        } else {
            None
        };
        Ok(LookupOutcome::Applied(reading, saved))
    }

    async fn usable_coordinate(&self) -> Result<Coordinate> {
        if let Some(coordinate) = self.state.borrow().coordinate() {
            return Ok(coordinate);
        }
        if matches!(*self.state.borrow(), LocationState::PermissionDenied) {
            return Err(WeatherTimelineError::location_unavailable(
                "location permission denied",
            ));
        }

        let fix = match self.location.last_known_location().await {
            Some(coordinate) => Some(coordinate),
            None => self.location.current_location().await,
        };
        fix.ok_or_else(|| WeatherTimelineError::location_unavailable("no location fix available"))
    }
}
