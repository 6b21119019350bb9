//! End-to-end tests over the public library API

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures::StreamExt;
use tempfile::TempDir;

use weather_timeline::{
    Coordinate, FixedLocationProvider, HistoryService, HistoryStore, HourlySeries, LocationFeed,
    LocationProvider, LookupOutcome, WeatherApi, WeatherQueryService, WeatherSession,
    WeatherTimelineError,
};

/// Serves a fixed two-sample day and remembers what was asked for
struct RecordingApi {
    requests: Mutex<Vec<(f64, f64, NaiveDate, NaiveDate)>>,
}

impl RecordingApi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl WeatherApi for RecordingApi {
    async fn hourly_series(
        &self,
        coordinate: &Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<HourlySeries> {
        self.requests.lock().unwrap().push((
            coordinate.latitude,
            coordinate.longitude,
            start,
            end,
        ));
        let day = start.format("%Y-%m-%d");
        Ok(HourlySeries {
            time: vec![format!("{day}T00:00"), format!("{day}T12:00")],
            temperature: vec![Some(1.0), Some(20.0)],
            weather_code: vec![Some(3), Some(80)],
            wind_speed: vec![Some(4.0), Some(9.5)],
            humidity: vec![Some(88), Some(60)],
        })
    }
}

fn history(dir: &TempDir) -> HistoryService {
    let store = HistoryStore::open(dir.path().join("history")).unwrap();
    HistoryService::new(Arc::new(store))
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[tokio::test]
async fn noon_is_used_when_no_time_is_given() {
    let api = RecordingApi::new();
    let service = WeatherQueryService::new(api.clone());

    let reading = service
        .fetch(&Coordinate::new(50.45, 30.52), date(), None)
        .await
        .unwrap();

    assert_eq!(reading.temperature, 20.0);
    assert_eq!(reading.weather_code, 80);
    assert_eq!(reading.description(), "Ливень");
    assert_eq!(reading.timestamp, date().and_hms_opt(12, 0, 0).unwrap());
    assert_eq!(
        api.requests.lock().unwrap().as_slice(),
        &[(50.45, 30.52, date(), date())]
    );
}

#[tokio::test]
async fn unmatched_time_falls_back_to_first_sample() {
    let service = WeatherQueryService::new(RecordingApi::new());

    let reading = service
        .fetch(
            &Coordinate::new(0.0, 0.0),
            date(),
            NaiveTime::from_hms_opt(7, 0, 0),
        )
        .await
        .unwrap();

    assert_eq!(reading.temperature, 1.0);
    assert_eq!(reading.humidity, 88);
    assert_eq!(reading.timestamp, date().and_hms_opt(7, 0, 0).unwrap());
}

#[tokio::test]
async fn invalid_coordinate_never_reaches_the_api() {
    let api = RecordingApi::new();
    let service = WeatherQueryService::new(api.clone());

    let err = service
        .fetch(&Coordinate::new(0.0, 181.0), date(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherTimelineError::InvalidCoordinate { .. }));
    assert!(api.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn lookups_are_saved_listed_and_cleared() {
    let dir = TempDir::new().unwrap();
    let history = history(&dir);
    let session = WeatherSession::new(
        WeatherQueryService::new(RecordingApi::new()),
        history.clone(),
        Arc::new(FixedLocationProvider::new(Some(Coordinate::new(
            -33.87, 151.21,
        )))),
    );

    let mut ids = Vec::new();
    for _ in 0..3 {
        match session.lookup(date(), None, true).await.unwrap() {
            LookupOutcome::Applied(_, Some(id)) => ids.push(id),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    let records = history.snapshot().await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert!(records.iter().all(|r| r.weather_description == "Ливень"));
    assert_eq!(records[0].format_coordinates(), "33.8700° S, 151.2100° E");

    history.delete_by_id(ids[1]).await.unwrap();
    assert_eq!(history.count().await, 2);
    assert!(history.get_by_id(ids[1]).await.unwrap().is_none());

    history.delete_all().await.unwrap();
    assert_eq!(history.count().await, 0);
    assert!(history.snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn history_stream_follows_saves() {
    let dir = TempDir::new().unwrap();
    let history = history(&dir);
    let session = WeatherSession::new(
        WeatherQueryService::new(RecordingApi::new()),
        history.clone(),
        Arc::new(FixedLocationProvider::new(Some(Coordinate::new(1.0, 1.0)))),
    );

    let mut live = Box::pin(history.list());
    assert!(live.next().await.unwrap().unwrap().is_empty());

    session.lookup(date(), None, true).await.unwrap();
    let updated = tokio::time::timeout(Duration::from_secs(5), live.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(updated.len(), 1);
}

#[tokio::test]
async fn session_uses_pushed_location() {
    let dir = TempDir::new().unwrap();
    let api = RecordingApi::new();
    let feed = Arc::new(LocationFeed::new());
    let session = WeatherSession::new(
        WeatherQueryService::new(api.clone()),
        history(&dir),
        feed.clone(),
    );

    let err = session.lookup(date(), None, false).await.unwrap_err();
    assert!(matches!(err, WeatherTimelineError::LocationUnavailable { .. }));

    feed.publish(Coordinate::new(64.13, -21.9));
    let outcome = session.lookup(date(), None, false).await.unwrap();
    assert!(matches!(outcome, LookupOutcome::Applied(_, None)));
    assert_eq!(api.requests.lock().unwrap()[0].1, -21.9);
}

#[tokio::test(start_paused = true)]
async fn closed_subscription_stops_delivering() {
    let provider = Arc::new(FixedLocationProvider::new(Some(Coordinate::new(3.0, 4.0))));
    let mut updates = provider.clone().location_updates(Duration::from_secs(1));

    assert!(updates.next().await.is_some());
    updates.close();

    // The provider is only shared with the aborted task, which lets go of it
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(Arc::strong_count(&provider), 1);
}
