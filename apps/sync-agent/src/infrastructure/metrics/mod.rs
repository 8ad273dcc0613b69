//! Prometheus Metrics Module
//!
//! Exposes agent metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Frames**: feed frames received and dropped, by feed
//! - **Connections**: feed connectivity and reconnection attempts
//! - **Buffers**: rolling chart buffer occupancy, by feed
//! - **Mutations**: record API calls by operation and outcome
//! - **Conflicts**: version conflicts detected
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::connection::FeedKind;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Frame counters
    describe_counter!(
        "sync_agent_frames_received_total",
        "Total feed frames decoded successfully"
    );
    describe_counter!(
        "sync_agent_frames_dropped_total",
        "Total feed frames dropped as malformed"
    );

    // Connection metrics
    describe_gauge!(
        "sync_agent_feed_connected",
        "Whether the feed connection is open (1) or not (0)"
    );
    describe_counter!(
        "sync_agent_reconnects_total",
        "Total feed reconnection attempts"
    );

    // Buffer gauges
    describe_gauge!(
        "sync_agent_buffer_len",
        "Samples currently held in the rolling chart buffer"
    );

    // Record API counters
    describe_counter!(
        "sync_agent_mutations_total",
        "Total record API calls by operation and outcome"
    );
    describe_counter!(
        "sync_agent_conflicts_total",
        "Total version conflicts reported by the server"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for record API operations.
#[derive(Debug, Clone, Copy)]
pub enum MutationKind {
    /// Full collection fetch.
    Refresh,
    /// Record creation.
    Create,
    /// Record update.
    Update,
    /// Record deletion.
    Delete,
}

impl MutationKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Metric labels for record API call outcomes.
#[derive(Debug, Clone, Copy)]
pub enum MutationOutcome {
    /// Call succeeded.
    Ok,
    /// Server reported a version conflict.
    Conflict,
    /// Call failed for any other reason.
    Failed,
}

impl MutationOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Conflict => "conflict",
            Self::Failed => "failed",
        }
    }
}

/// Record a successfully decoded feed frame.
pub fn record_frame_received(feed: FeedKind) {
    counter!(
        "sync_agent_frames_received_total",
        "feed" => feed.as_str()
    )
    .increment(1);
}

/// Record a malformed feed frame that was dropped.
pub fn record_frame_dropped(feed: FeedKind) {
    counter!(
        "sync_agent_frames_dropped_total",
        "feed" => feed.as_str()
    )
    .increment(1);
}

/// Update the feed connectivity gauge.
pub fn set_feed_connected(feed: FeedKind, connected: bool) {
    gauge!(
        "sync_agent_feed_connected",
        "feed" => feed.as_str()
    )
    .set(if connected { 1.0 } else { 0.0 });
}

/// Update the rolling buffer occupancy gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_buffer_len(feed: FeedKind, len: usize) {
    gauge!(
        "sync_agent_buffer_len",
        "feed" => feed.as_str()
    )
    .set(len as f64);
}

/// Record a feed reconnection attempt.
pub fn record_reconnect(feed: FeedKind) {
    counter!(
        "sync_agent_reconnects_total",
        "feed" => feed.as_str()
    )
    .increment(1);
}

/// Record a record API call and its outcome.
pub fn record_mutation(kind: MutationKind, outcome: MutationOutcome) {
    counter!(
        "sync_agent_mutations_total",
        "operation" => kind.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a version conflict reported by the server.
pub fn record_conflict() {
    counter!("sync_agent_conflicts_total").increment(1);
}

// =============================================================================
// Tests
// =============================================================================
