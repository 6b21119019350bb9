use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use futures::Stream;
use futures::stream;
use tracing::{info, instrument};

use super::HistoryStore;
use crate::models::{HistoryEntry, HistoryRecord, WeatherReading, weather_code_to_description};
use crate::{Result, WeatherTimelineError};

/// Query over the stored log, re-run on every change
#[derive(Debug, Clone)]
enum HistoryQuery {
    All,
    Between(NaiveDateTime, NaiveDateTime),
    Search(String),
}

fn persistence(err: anyhow::Error) -> WeatherTimelineError {
    WeatherTimelineError::persistence(&err)
}

/// Saves readings to the history log and exposes queries over it
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<HistoryStore>,
}

impl HistoryService {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        Self { store }
    }

    /// Persist a reading as a lookup made now at the current location
    #[instrument(skip_all, fields(code = reading.weather_code))]
    pub async fn save(&self, reading: &WeatherReading) -> Result<u64> {
        let entry = HistoryEntry {
            timestamp: Local::now().naive_local(),
            latitude: reading.coordinate.latitude,
            longitude: reading.coordinate.longitude,
            temperature: reading.temperature,
            weather_code: reading.weather_code,
            wind_speed: reading.wind_speed,
            humidity: reading.humidity,
            weather_description: weather_code_to_description(reading.weather_code).to_string(),
            location_label: None,
            was_current_location: true,
        };

        let id = self.store.insert(entry).await.map_err(persistence)?;
        info!("Saved weather lookup as history record {}", id);
        Ok(id)
    }

    /// Live view of the whole log, newest first.
    ///
    /// Yields the current records immediately and again after every change.
    /// The stream never ends on its own; drop it to unsubscribe and call
    /// again to start over.
    pub fn list(&self) -> impl Stream<Item = Result<Vec<HistoryRecord>>> + Send + 'static {
        self.observe(HistoryQuery::All)
    }

    /// Live view of records with `start <= timestamp <= end`
    pub fn list_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> impl Stream<Item = Result<Vec<HistoryRecord>>> + Send + 'static {
        self.observe(HistoryQuery::Between(start, end))
    }

    /// Live view of records whose description contains `text`
    pub fn search(
        &self,
        text: &str,
    ) -> impl Stream<Item = Result<Vec<HistoryRecord>>> + Send + 'static {
        self.observe(HistoryQuery::Search(text.to_string()))
    }

    /// One-shot copy of the whole log, newest first
    pub async fn snapshot(&self) -> Result<Vec<HistoryRecord>> {
        run_query(&self.store, &HistoryQuery::All).await
    }

    pub async fn get_by_id(&self, id: u64) -> Result<Option<HistoryRecord>> {
        self.store.get(id).await.map_err(persistence)
    }

    /// Deleting a missing id is not an error
    pub async fn delete_by_id(&self, id: u64) -> Result<()> {
        self.store.delete_by_id(id).await.map_err(persistence)?;
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<()> {
        let removed = self.store.delete_all().await.map_err(persistence)?;
        info!("Cleared {} history records", removed);
        Ok(())
    }

    pub async fn count(&self) -> usize {
        self.store.count().await
    }

    fn observe(
        &self,
        query: HistoryQuery,
    ) -> impl Stream<Item = Result<Vec<HistoryRecord>>> + Send + 'static {
        let store = Arc::clone(&self.store);
        let mut changes = store.subscribe();
        changes.mark_changed();

        stream::unfold(
            (store, changes, query),
            |(store, mut changes, query)| async move {
                // The sender lives in the store we hold, so this only fails on shutdown
                changes.changed().await.ok()?;
                let records = run_query(&store, &query).await;
                Some((records, (store, changes, query)))
            },
        )
    }
}

async fn run_query(store: &HistoryStore, query: &HistoryQuery) -> Result<Vec<HistoryRecord>> {
    let records = match query {
        HistoryQuery::All => store.list().await,
        HistoryQuery::Between(start, end) => store.list_between(*start, *end).await,
        HistoryQuery::Search(text) => store.search(text).await,
    };
    records.map_err(persistence)
}
