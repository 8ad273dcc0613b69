//! Demo Feed
//!
//! Synthetic sample source used when no live endpoint is configured, so
//! the dashboard has something to show out of the box. On start it emits
//! a connected event and a seeded backlog, then appends one random
//! sample per tick until cancelled. It speaks the same [`FeedEvent`]
//! protocol as the live transport and is consumed by the same
//! [`super::FeedService`].

use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::timeseries::{FeedEvent, Sample, WINDOW_SIZE};

/// Configuration for the demo feed.
#[derive(Debug, Clone)]
pub struct DemoFeedConfig {
    /// Number of samples in the seeded backlog.
    pub seed_len: usize,
    /// Time between appended samples.
    pub cadence: Duration,
}

impl Default for DemoFeedConfig {
    fn default() -> Self {
        Self {
            seed_len: WINDOW_SIZE,
            cadence: Duration::from_secs(1),
        }
    }
}

/// Generates synthetic feed events on a fixed cadence.
pub struct DemoFeed {
    config: DemoFeedConfig,
    event_tx: mpsc::Sender<FeedEvent>,
    cancel: CancellationToken,
}

impl DemoFeed {
    /// Create a new demo feed.
    #[must_use]
    pub fn new(
        config: DemoFeedConfig,
        event_tx: mpsc::Sender<FeedEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            event_tx,
            cancel,
        }
    }

    /// Emit the backlog, then one sample per tick until cancelled.
    pub async fn run(self) {
        let _ = self.event_tx.send(FeedEvent::Connected).await;

        let seed = seed_samples(self.config.seed_len);
        let _ = self.event_tx.send(FeedEvent::Snapshot(seed)).await;

        let mut ticker = tokio::time::interval(self.config.cadence);
        // The first tick completes immediately; the backlog covers it.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("Demo feed cancelled");
                    let _ = self.event_tx.send(FeedEvent::Disconnected).await;
                    return;
                }
                _ = ticker.tick() => {
                    let sample = Sample::now(rand::rng().random_range(0.0..100.0));
                    if self.event_tx.send(FeedEvent::Sample(sample)).await.is_err() {
                        // Consumer is gone; nothing left to feed.
                        return;
                    }
                }
            }
        }
    }
}

/// Build a backlog of random samples with strictly increasing timestamps.
#[allow(clippy::cast_possible_wrap)]
fn seed_samples(len: usize) -> Vec<Sample> {
    let now = chrono::Utc::now();
    let mut rng = rand::rng();

    (0..len)
        .map(|i| {
            let offset = chrono::Duration::seconds((len - i) as i64);
            Sample::new((now - offset).to_rfc3339(), rng.random_range(0.0..100.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_backlog_fills_the_window() {
        let samples = seed_samples(WINDOW_SIZE);

        assert_eq!(samples.len(), WINDOW_SIZE);
        for sample in &samples {
            assert!(sample.value >= 0.0 && sample.value < 100.0);
        }
        for pair in samples.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn emits_backlog_first_then_ticks() {
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let config = DemoFeedConfig {
            seed_len: 5,
            cadence: Duration::from_millis(5),
        };

        let feed = DemoFeed::new(config, tx, cancel.clone());
        let handle = tokio::spawn(feed.run());

        assert!(matches!(rx.recv().await, Some(FeedEvent::Connected)));
        match rx.recv().await {
            Some(FeedEvent::Snapshot(samples)) => assert_eq!(samples.len(), 5),
            other => panic!("expected Snapshot, got {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(FeedEvent::Sample(_))));

        cancel.cancel();
        // Disconnected arrives after any in-flight sample.
        loop {
            match rx.recv().await {
                Some(FeedEvent::Disconnected) => break,
                Some(FeedEvent::Sample(_)) => {}
                other => panic!("expected Disconnected, got {other:?}"),
            }
        }
        handle.await.unwrap();
    }
}
