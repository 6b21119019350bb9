use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tracing::debug;

use super::LocationProvider;
use crate::models::Coordinate;

/// A position that never moves, e.g. taken from configuration
#[derive(Debug, Clone)]
pub struct FixedLocationProvider {
    coordinate: Option<Coordinate>,
}

impl FixedLocationProvider {
    #[must_use]
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_location(&self) -> Option<Coordinate> {
        self.coordinate.map(|c| c.with_captured_at(Utc::now()))
    }

    async fn last_known_location(&self) -> Option<Coordinate> {
        self.coordinate
    }
}

/// Positions pushed in by an external source (GPS daemon, another service).
///
/// Only the freshest fix is kept; a fix older than the current one is dropped.
#[derive(Debug)]
pub struct LocationFeed {
    latest: watch::Sender<Option<Coordinate>>,
    // Serialises the freshness check with the write
    publish_lock: Mutex<()>,
}

impl Default for LocationFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationFeed {
    #[must_use]
    pub fn new() -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            latest,
            publish_lock: Mutex::new(()),
        }
    }

    /// Offer a new fix; returns whether it replaced the previous one
    pub fn publish(&self, coordinate: Coordinate) -> bool {
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let stale = matches!(*self.latest.borrow(), Some(ref current) if !coordinate.is_fresher_than(current));
        if stale {
            debug!("Dropping stale location fix from {}", coordinate.captured_at);
            return false;
        }
        self.latest.send_replace(Some(coordinate));
        true
    }

    /// Watch the freshest fix
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<Coordinate>> {
        self.latest.subscribe()
    }
}

#[async_trait]
impl LocationProvider for LocationFeed {
    async fn current_location(&self) -> Option<Coordinate> {
        *self.latest.borrow()
    }

    async fn last_known_location(&self) -> Option<Coordinate> {
        *self.latest.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationSubscription;
    use chrono::Duration as ChronoDuration;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fixed_provider() {
        let coordinate = Coordinate::new(48.85, 2.35).with_accuracy(5.0);
        let provider = FixedLocationProvider::new(Some(coordinate));

        assert_eq!(provider.last_known_location().await, Some(coordinate));
        let current = provider.current_location().await.unwrap();
        assert_eq!(current.latitude, 48.85);
        assert_eq!(current.accuracy, 5.0);
        assert!(current.captured_at >= coordinate.captured_at);

        let empty = FixedLocationProvider::new(None);
        assert!(empty.current_location().await.is_none());
        assert!(empty.last_known_location().await.is_none());
    }

    #[tokio::test]
    async fn test_feed_keeps_freshest_fix() {
        let feed = LocationFeed::new();
        assert!(feed.current_location().await.is_none());

        let first = Coordinate::new(1.0, 1.0);
        let older = first.with_captured_at(first.captured_at - ChronoDuration::seconds(30));
        let newer = first.with_captured_at(first.captured_at + ChronoDuration::seconds(30));

        assert!(feed.publish(first));
        assert!(!feed.publish(older));
        assert_eq!(feed.last_known_location().await, Some(first));

        assert!(feed.publish(newer));
        assert_eq!(feed.current_location().await, Some(newer));
        assert_eq!(*feed.watch().borrow(), Some(newer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_are_delivered_until_closed() {
        let provider = Arc::new(FixedLocationProvider::new(Some(Coordinate::new(10.0, 20.0))));
        let mut updates: LocationSubscription =
            provider.location_updates(Duration::from_millis(10_000));

        let first = updates.next().await.unwrap();
        let second = updates.next().await.unwrap();
        assert_eq!(first.latitude, 10.0);
        assert!(second.captured_at >= first.captured_at);

        updates.close();
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_is_a_stream() {
        let provider = Arc::new(FixedLocationProvider::new(Some(Coordinate::new(-1.0, -2.0))));
        let updates = provider.location_updates(Duration::from_secs(1));

        let fixes: Vec<Coordinate> = updates.take(3).collect().await;
        assert_eq!(fixes.len(), 3);
        assert!(fixes.iter().all(|c| c.longitude == -2.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_updates_without_fix() {
        let provider = Arc::new(FixedLocationProvider::new(None));
        let mut updates = provider.location_updates(Duration::from_secs(1));

        let waited = tokio::time::timeout(Duration::from_secs(5), updates.next()).await;
        assert!(waited.is_err());
    }
}
