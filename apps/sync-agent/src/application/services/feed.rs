//! Feed Projection Service
//!
//! Consumes [`FeedEvent`]s from a transport and projects them onto the
//! shared state: the rolling sample buffer, the feed's connection state,
//! and the broadcast hub. Events are applied strictly in arrival order;
//! this service is the only writer to its buffer.
//!
//! Snapshot frames update the buffer only; the hub lanes carry the
//! incremental ticks and connection transitions.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::domain::connection::{ConnectionState, FeedState};
use crate::domain::timeseries::{FeedEvent, SeriesBuffer};
use crate::infrastructure::broadcast::SharedSampleHub;
use crate::infrastructure::metrics;

/// Projects feed events onto the buffer, connection state, and hub.
pub struct FeedService {
    buffer: Arc<RwLock<SeriesBuffer>>,
    state: Arc<FeedState>,
    hub: SharedSampleHub,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub fn new(
        buffer: Arc<RwLock<SeriesBuffer>>,
        state: Arc<FeedState>,
        hub: SharedSampleHub,
    ) -> Self {
        Self { buffer, state, hub }
    }

    /// Consume events until the transport drops its sender.
    pub async fn run(self, mut events: mpsc::Receiver<FeedEvent>) {
        while let Some(event) = events.recv().await {
            self.apply(event);
        }
        tracing::info!(feed = self.state.feed().as_str(), "Feed event channel closed");
    }

    /// Apply one event to the shared state.
    pub fn apply(&self, event: FeedEvent) {
        match event {
            FeedEvent::Connected => {
                self.state.set_state(ConnectionState::Open);
                metrics::set_feed_connected(self.state.feed(), true);
                self.publish_connection(ConnectionState::Open);
                tracing::info!(feed = self.state.feed().as_str(), "Feed connected");
            }
            FeedEvent::Disconnected => {
                self.state.set_state(ConnectionState::Closed);
                metrics::set_feed_connected(self.state.feed(), false);
                self.publish_connection(ConnectionState::Closed);
                tracing::warn!(feed = self.state.feed().as_str(), "Feed disconnected");
            }
            FeedEvent::Reconnecting { attempt } => {
                self.state.set_state(ConnectionState::Connecting);
                self.state.set_reconnect_attempts(attempt);
                self.publish_connection(ConnectionState::Connecting);
                tracing::info!(
                    feed = self.state.feed().as_str(),
                    attempt,
                    "Feed reconnecting"
                );
            }
            FeedEvent::Snapshot(samples) => {
                self.state.add_samples(samples.len() as u64);
                let len = {
                    let mut buffer = self.buffer.write();
                    buffer.initialize(samples);
                    buffer.len()
                };
                metrics::set_buffer_len(self.state.feed(), len);
            }
            FeedEvent::Sample(sample) => {
                self.state.add_samples(1);
                let len = {
                    let mut buffer = self.buffer.write();
                    buffer.append(sample.clone());
                    buffer.len()
                };
                metrics::set_buffer_len(self.state.feed(), len);
                let _ = self.hub.send_sample(self.state.feed(), sample);
            }
            FeedEvent::Error(message) => {
                tracing::warn!(feed = self.state.feed().as_str(), error = %message, "Feed error");
                self.state.record_error(message);
            }
        }
    }

    fn publish_connection(&self, state: ConnectionState) {
        let _ = self.hub.send_connection(self.state.feed(), state);
    }
}
