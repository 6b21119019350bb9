//! Location Provider Module
//!
//! Sources of the device position: one-shot current and last-known fixes, and a
//! continuous subscription that delivers fixes until it is closed.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::Coordinate;

pub mod providers;
pub mod state;

pub use providers::{FixedLocationProvider, LocationFeed};
pub use state::LocationState;

/// Minimum interval between continuous updates unless configured otherwise
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(10_000);

/// A source of device positions
#[async_trait]
pub trait LocationProvider: Send + Sync + 'static {
    /// A fresh fix, or `None` if none can be obtained right now
    async fn current_location(&self) -> Option<Coordinate>;

    /// The most recent fix already known, without waiting for a new one
    async fn last_known_location(&self) -> Option<Coordinate>;

    /// Poll `current_location` every `interval` and deliver every fix
    fn location_updates(self: Arc<Self>, interval: Duration) -> LocationSubscription {
        let (sender, receiver) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Some(coordinate) = self.current_location().await {
                    if sender.send(coordinate).await.is_err() {
                        break;
                    }
                }
            }
            debug!("Location update task finished");
        });
        LocationSubscription::new(receiver, task)
    }
}

/// Handle to a running location update feed.
///
/// Delivery stops for good once the handle is closed or dropped.
#[derive(Debug)]
pub struct LocationSubscription {
    receiver: mpsc::Receiver<Coordinate>,
    task: JoinHandle<()>,
}

impl LocationSubscription {
    pub fn new(receiver: mpsc::Receiver<Coordinate>, task: JoinHandle<()>) -> Self {
        Self { receiver, task }
    }

    /// Wait for the next fix; `None` once the feed has ended
    pub async fn next(&mut self) -> Option<Coordinate> {
        self.receiver.recv().await
    }

    /// Stop the feed
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.task.abort();
        self.receiver.close();
    }
}

impl Stream for LocationSubscription {
    type Item = Coordinate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Coordinate>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}
