//! Live Feed WebSocket Client
//!
//! Maintains the push channel to the data service. The client owns the
//! whole connection lifecycle: connect, decode inbound frames, hand the
//! results to the consumer as events over an mpsc channel, reconnect on
//! the backoff schedule when the session drops, and give up once the
//! attempt budget is spent.
//!
//! # Protocol
//!
//! Frames are JSON: an array of samples right after connect (the backlog)
//! and single sample objects afterwards. See [`super::codec`].

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::domain::connection::FeedState;
use crate::domain::timeseries::FeedEvent;
use crate::infrastructure::metrics;

use super::codec::{FrameCodec, StreamFrame};
use super::reconnect::{ReconnectConfig, ReconnectPolicy};

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the feed client.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Maximum reconnection attempts exceeded.
    #[error("gave up reconnecting after {attempts} attempts")]
    MaxReconnectAttemptsExceeded {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Connection closed by the server.
    #[error("connection closed")]
    ConnectionClosed,
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    /// WebSocket URL, without credentials.
    pub url: String,
    /// Optional session token, sent as a `?token=` query parameter.
    pub token: Option<String>,
    /// Reconnection configuration.
    pub reconnect: ReconnectConfig,
}

impl StreamClientConfig {
    /// Create a new configuration with the default reconnect schedule.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Attach a session token to authenticate the connection.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

// =============================================================================
// Feed Client
// =============================================================================

/// WebSocket client for the live sample feed.
///
/// Manages the connection lifecycle including:
/// - Frame decoding and dispatch as [`FeedEvent`]s
/// - Automatic reconnection with exponential backoff
/// - Deterministic shutdown via a [`CancellationToken`]
pub struct StreamClient {
    config: StreamClientConfig,
    codec: FrameCodec,
    event_tx: mpsc::Sender<FeedEvent>,
    cancel: CancellationToken,
    state: Arc<FeedState>,
}

impl StreamClient {
    /// Create a new feed client.
    #[must_use]
    pub fn new(
        config: StreamClientConfig,
        event_tx: mpsc::Sender<FeedEvent>,
        cancel: CancellationToken,
        state: Arc<FeedState>,
    ) -> Self {
        Self {
            config,
            codec: FrameCodec::new(),
            event_tx,
            cancel,
            state,
        }
    }

    /// Run the feed connection loop.
    ///
    /// Connects to the push channel and forwards decoded frames as events
    /// until cancelled. A dropped session is retried on the backoff
    /// schedule; the schedule restarts only after a session actually
    /// opens. Once the attempt budget is spent the loop returns an error
    /// and the connection stays closed until `run` is called again.
    ///
    /// # Errors
    ///
    /// Returns an error when the reconnection budget is exhausted.
    pub async fn run(self: Arc<Self>) -> Result<(), StreamError> {
        let mut policy = ReconnectPolicy::new(self.config.reconnect.clone());

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Feed client cancelled");
                return Ok(());
            }

            match self.connect_and_run(&mut policy).await {
                Ok(()) => {
                    tracing::info!("Feed connection closed gracefully");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Feed connection error");

                    let _ = self.event_tx.send(FeedEvent::Error(e.to_string())).await;
                    let _ = self.event_tx.send(FeedEvent::Disconnected).await;

                    if let Some(delay) = policy.next_delay() {
                        let attempt = policy.attempt_count();
                        tracing::info!(
                            attempt,
                            delay_ms = delay.as_millis(),
                            "Reconnecting to live feed"
                        );

                        metrics::record_reconnect(self.state.feed());
                        let _ = self.event_tx.send(FeedEvent::Reconnecting { attempt }).await;

                        tokio::select! {
                            () = self.cancel.cancelled() => {
                                tracing::info!("Feed client cancelled during reconnect delay");
                                return Ok(());
                            }
                            () = tokio::time::sleep(delay) => {}
                        }
                    } else {
                        return Err(StreamError::MaxReconnectAttemptsExceeded {
                            attempts: policy.attempt_count(),
                        });
                    }
                }
            }
        }
    }

    /// Connect to the WebSocket and run until error or cancellation.
    async fn connect_and_run(&self, policy: &mut ReconnectPolicy) -> Result<(), StreamError> {
        tracing::info!(url = %self.config.url, "Connecting to live feed");

        let url = self.endpoint_url();
        let (ws_stream, _response) = tokio_tungstenite::connect_async(&url).await?;

        // The backoff schedule restarts only once a session actually opens.
        policy.reset();
        let session_id = uuid::Uuid::new_v4().as_u64_pair().0;
        tracing::info!(session_id = %session_id, "Live feed connected");
        let _ = self.event_tx.send(FeedEvent::Connected).await;

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_frame(&text).await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!(session_id = %session_id, "Server sent close frame");
                            return Err(StreamError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ignore pongs and binary frames
                        }
                        Some(Err(e)) => {
                            return Err(e.into());
                        }
                        None => {
                            tracing::info!(session_id = %session_id, "WebSocket stream ended");
                            return Err(StreamError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Decode one inbound frame and forward it as an event.
    ///
    /// Malformed frames never tear the session down: they are logged at
    /// debug, counted, and dropped.
    async fn handle_text_frame(&self, text: &str) {
        match self.codec.decode(text) {
            Ok(StreamFrame::Snapshot(samples)) => {
                metrics::record_frame_received(self.state.feed());
                let _ = self.event_tx.send(FeedEvent::Snapshot(samples)).await;
            }
            Ok(StreamFrame::Sample(sample)) => {
                metrics::record_frame_received(self.state.feed());
                let _ = self.event_tx.send(FeedEvent::Sample(sample)).await;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Dropping malformed feed frame");
                self.state.increment_dropped();
                metrics::record_frame_dropped(self.state.feed());
            }
        }
    }

    /// Build the connection URL, appending the percent-encoded session
    /// token when present.
    fn endpoint_url(&self) -> String {
        match &self.config.token {
            Some(token) if self.config.url.contains('?') => {
                format!("{}&token={}", self.config.url, urlencoding::encode(token))
            }
            Some(token) => format!("{}?token={}", self.config.url, urlencoding::encode(token)),
            None => self.config.url.clone(),
        }
    }
}
