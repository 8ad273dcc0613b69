//! Broadcast Channel Adapters
//!
//! Message distribution using tokio broadcast channels for fan-out to
//! multiple subscribers.
//!
//! # Architecture
//!
//! The [`SampleHub`] provides one channel per feed (live metric, demo
//! metric) plus a channel for connection lifecycle updates, so chart
//! consumers subscribe to typed streams instead of sharing mutable
//! state with the transport's handlers.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::domain::connection::{ConnectionState, FeedKind};
use crate::domain::timeseries::Sample;

// =============================================================================
// Broadcast Messages
// =============================================================================

/// One sample published for a feed.
#[derive(Debug, Clone)]
pub struct SampleBroadcast {
    /// Which feed produced it.
    pub feed: FeedKind,
    /// The sample data.
    pub sample: Sample,
}

/// A feed connection state change.
#[derive(Debug, Clone)]
pub struct ConnectionBroadcast {
    /// Which feed changed.
    pub feed: FeedKind,
    /// The new state.
    pub state: ConnectionState,
}

// =============================================================================
// Sample Hub
// =============================================================================

/// Configuration for broadcast channel capacities.
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Capacity for the live sample channel.
    pub live_capacity: usize,
    /// Capacity for the demo sample channel.
    pub demo_capacity: usize,
    /// Capacity for the connection update channel.
    pub connections_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            live_capacity: 1_000,
            demo_capacity: 1_000,
            connections_capacity: 64,
        }
    }
}

/// Central hub for sample and connection fan-out.
///
/// Supports multiple receivers per channel; sending with no receivers
/// is not an error, the message is simply dropped.
#[derive(Debug)]
pub struct SampleHub {
    live_tx: broadcast::Sender<SampleBroadcast>,
    demo_tx: broadcast::Sender<SampleBroadcast>,
    connections_tx: broadcast::Sender<ConnectionBroadcast>,
}

impl SampleHub {
    /// Create a new hub with the given configuration.
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            live_tx: broadcast::channel(config.live_capacity).0,
            demo_tx: broadcast::channel(config.demo_capacity).0,
            connections_tx: broadcast::channel(config.connections_capacity).0,
        }
    }

    /// Create a new hub with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(HubConfig::default())
    }

    /// Send a sample to the feed's subscribers.
    ///
    /// Returns the number of receivers that got the message, or `None`
    /// if there are no active receivers.
    #[must_use]
    pub fn send_sample(&self, feed: FeedKind, sample: Sample) -> Option<usize> {
        let tx = match feed {
            FeedKind::Live => &self.live_tx,
            FeedKind::Demo => &self.demo_tx,
        };
        tx.send(SampleBroadcast { feed, sample }).ok()
    }

    /// Send a connection state change to subscribers.
    #[must_use]
    pub fn send_connection(&self, feed: FeedKind, state: ConnectionState) -> Option<usize> {
        self.connections_tx
            .send(ConnectionBroadcast { feed, state })
            .ok()
    }

    /// Get a new receiver for live samples.
    #[must_use]
    pub fn live_rx(&self) -> broadcast::Receiver<SampleBroadcast> {
        self.live_tx.subscribe()
    }

    /// Get a new receiver for demo samples.
    #[must_use]
    pub fn demo_rx(&self) -> broadcast::Receiver<SampleBroadcast> {
        self.demo_tx.subscribe()
    }

    /// Get a new receiver for connection updates.
    #[must_use]
    pub fn connections_rx(&self) -> broadcast::Receiver<ConnectionBroadcast> {
        self.connections_tx.subscribe()
    }

    /// Get statistics about all channels.
    #[must_use]
    pub fn stats(&self) -> HubStats {
        HubStats {
            live_receivers: self.live_tx.receiver_count(),
            demo_receivers: self.demo_tx.receiver_count(),
            connection_receivers: self.connections_tx.receiver_count(),
        }
    }
}

/// Shared hub reference.
pub type SharedSampleHub = Arc<SampleHub>;

/// Statistics about hub channels.
#[derive(Debug, Clone, Default)]
pub struct HubStats {
    /// Number of live sample receivers.
    pub live_receivers: usize,
    /// Number of demo sample receivers.
    pub demo_receivers: usize,
    /// Number of connection update receivers.
    pub connection_receivers: usize,
}

impl HubStats {
    /// Total receivers across all channels.
    #[must_use]
    pub const fn total_receivers(&self) -> usize {
        self.live_receivers + self.demo_receivers + self.connection_receivers
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_sample() -> Sample {
        Sample::new("2024-01-01T00:00:00Z", 42.0)
    }

    #[test]
    fn hub_starts_with_no_receivers() {
        let hub = SampleHub::with_defaults();
        assert_eq!(hub.stats().total_receivers(), 0);
    }

    #[test]
    fn receiver_count_tracks_subscriptions() {
        let hub = SampleHub::with_defaults();

        let _rx1 = hub.live_rx();
        let _rx2 = hub.live_rx();
        assert_eq!(hub.stats().live_receivers, 2);

        {
            let _rx3 = hub.demo_rx();
            assert_eq!(hub.stats().demo_receivers, 1);
        }
        assert_eq!(hub.stats().demo_receivers, 0);
    }

    #[tokio::test]
    async fn samples_route_to_their_feed_channel() {
        let hub = SampleHub::with_defaults();
        let mut live = hub.live_rx();
        let mut demo = hub.demo_rx();

        assert_eq!(hub.send_sample(FeedKind::Live, make_test_sample()), Some(1));
        assert_eq!(hub.send_sample(FeedKind::Demo, make_test_sample()), Some(1));

        assert_eq!(live.recv().await.unwrap().feed, FeedKind::Live);
        assert_eq!(demo.recv().await.unwrap().feed, FeedKind::Demo);
    }

    #[tokio::test]
    async fn multiple_receivers_get_the_same_sample() {
        let hub = SampleHub::with_defaults();
        let mut rx1 = hub.live_rx();
        let mut rx2 = hub.live_rx();

        let _ = hub.send_sample(FeedKind::Live, make_test_sample());

        assert_eq!(rx1.recv().await.unwrap().sample.value, 42.0);
        assert_eq!(rx2.recv().await.unwrap().sample.value, 42.0);
    }

    #[test]
    fn send_with_no_receivers_returns_none() {
        let hub = SampleHub::with_defaults();
        assert!(hub.send_sample(FeedKind::Live, make_test_sample()).is_none());
        assert!(
            hub.send_connection(FeedKind::Live, ConnectionState::Open)
                .is_none()
        );
    }

    #[tokio::test]
    async fn connection_updates_fan_out() {
        let hub = SampleHub::with_defaults();
        let mut rx = hub.connections_rx();

        let _ = hub.send_connection(FeedKind::Live, ConnectionState::Open);

        let update = rx.recv().await.unwrap();
        assert_eq!(update.feed, FeedKind::Live);
        assert_eq!(update.state, ConnectionState::Open);
    }
}
