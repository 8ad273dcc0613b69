//! Feed Connection State
//!
//! Shared, lock-protected view of a push-channel connection: the
//! three-state lifecycle plus counters the health surface and metrics
//! report. Written by the stream client and the feed service, read by
//! everyone else.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

// =============================================================================
// Types
// =============================================================================

/// Lifecycle of one push-channel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// A session is being established.
    Connecting,
    /// The session is open and frames are flowing.
    Open,
    /// No session; never connected, lost, or closed by shutdown.
    Closed,
}

/// Which feed a state object describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// The server-pushed live metric.
    Live,
    /// The locally generated demo metric.
    Demo,
}

impl FeedKind {
    /// Stable label for metrics and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Demo => "demo",
        }
    }
}

// =============================================================================
// Feed State
// =============================================================================

/// Connection state and counters for one feed.
///
/// All fields are interior-mutable so one `Arc<FeedState>` can be
/// shared between the stream client, the feed service, and the health
/// server.
#[derive(Debug)]
pub struct FeedState {
    feed: FeedKind,
    state: parking_lot::RwLock<ConnectionState>,
    last_connected_at: parking_lot::RwLock<Option<DateTime<Utc>>>,
    error_message: parking_lot::RwLock<Option<String>>,
    reconnect_attempts: AtomicU32,
    samples_received: AtomicU64,
    frames_dropped: AtomicU64,
}

impl FeedState {
    /// Create state for a feed, starting closed.
    #[must_use]
    pub const fn new(feed: FeedKind) -> Self {
        Self {
            feed,
            state: parking_lot::RwLock::new(ConnectionState::Closed),
            last_connected_at: parking_lot::RwLock::new(None),
            error_message: parking_lot::RwLock::new(None),
            reconnect_attempts: AtomicU32::new(0),
            samples_received: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    /// Which feed this state describes.
    #[must_use]
    pub const fn feed(&self) -> FeedKind {
        self.feed
    }

    /// Set the connection state. Opening clears the attempt counter
    /// and any recorded error.
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
        if state == ConnectionState::Open {
            *self.last_connected_at.write() = Some(Utc::now());
            self.reconnect_attempts.store(0, Ordering::Relaxed);
            *self.error_message.write() = None;
        }
    }

    /// Record a transport error message without changing the state;
    /// the close path owns the state transition.
    pub fn record_error(&self, message: String) {
        *self.error_message.write() = Some(message);
    }

    /// Note a scheduled reconnection attempt.
    pub fn set_reconnect_attempts(&self, attempts: u32) {
        self.reconnect_attempts.store(attempts, Ordering::Relaxed);
    }

    /// Count one applied sample (snapshot frames count their length).
    pub fn add_samples(&self, count: u64) {
        self.samples_received.fetch_add(count, Ordering::Relaxed);
    }

    /// Count one malformed frame that was dropped.
    pub fn increment_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Whether the session is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Total samples applied.
    #[must_use]
    pub fn samples_received(&self) -> u64 {
        self.samples_received.load(Ordering::Relaxed)
    }

    /// Reconnection attempts since the last successful open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }

    /// Snapshot for the health payload.
    #[must_use]
    pub fn status(&self) -> FeedStatus {
        FeedStatus {
            feed: self.feed,
            state: self.state(),
            last_connected_at: *self.last_connected_at.read(),
            error_message: self.error_message.read().clone(),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            samples_received: self.samples_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a feed for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct FeedStatus {
    /// Which feed.
    pub feed: FeedKind,
    /// Connection state at snapshot time.
    pub state: ConnectionState,
    /// When the session last opened.
    pub last_connected_at: Option<DateTime<Utc>>,
    /// Last transport error, if any since the last open.
    pub error_message: Option<String>,
    /// Attempts since the last successful open.
    pub reconnect_attempts: u32,
    /// Samples applied over the feed's lifetime.
    pub samples_received: u64,
    /// Malformed frames dropped over the feed's lifetime.
    pub frames_dropped: u64,
}
