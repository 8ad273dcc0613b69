//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for health checks, feed status reporting, and Prometheus
//! metrics. Used by container orchestrators, load balancers, and monitoring
//! systems.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /readyz` - Kubernetes readiness probe (checks feeds)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::domain::connection::{ConnectionState, FeedKind, FeedState, FeedStatus};
use crate::infrastructure::broadcast::{HubStats, SharedSampleHub};
use crate::infrastructure::metrics::get_metrics_handle;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy".
    pub status: HealthStatus,
    /// Agent version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Status of every enabled feed.
    pub feeds: Vec<FeedInfo>,
    /// Broadcast subscriber statistics.
    pub subscribers: SubscriberStatus,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All feeds connected.
    Healthy,
    /// Some feeds connected, some not.
    Degraded,
    /// No feed connected.
    Unhealthy,
}

/// Individual feed status.
#[derive(Debug, Clone, Serialize)]
pub struct FeedInfo {
    /// Which feed.
    pub feed: FeedKind,
    /// Connection state.
    pub state: ConnectionState,
    /// Whether this feed has an open session.
    pub connected: bool,
    /// Samples applied count.
    pub samples_received: u64,
    /// Malformed frames dropped count.
    pub frames_dropped: u64,
    /// Current reconnect attempts (0 once connected).
    pub reconnect_attempts: u32,
    /// When the session last opened.
    pub last_connected_at: Option<DateTime<Utc>>,
    /// Last transport error since the last open.
    pub error: Option<String>,
}

impl From<FeedStatus> for FeedInfo {
    fn from(status: FeedStatus) -> Self {
        Self {
            feed: status.feed,
            state: status.state,
            connected: status.state == ConnectionState::Open,
            samples_received: status.samples_received,
            frames_dropped: status.frames_dropped,
            reconnect_attempts: status.reconnect_attempts,
            last_connected_at: status.last_connected_at,
            error: status.error_message,
        }
    }
}

/// Broadcast subscriber statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberStatus {
    /// Live sample receivers.
    pub live_receivers: usize,
    /// Demo sample receivers.
    pub demo_receivers: usize,
    /// Connection update receivers.
    pub connection_receivers: usize,
}

impl From<HubStats> for SubscriberStatus {
    fn from(stats: HubStats) -> Self {
        Self {
            live_receivers: stats.live_receivers,
            demo_receivers: stats.demo_receivers,
            connection_receivers: stats.connection_receivers,
        }
    }
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    feeds: Vec<Arc<FeedState>>,
    hub: SharedSampleHub,
}

impl HealthServerState {
    /// Create new health server state over the enabled feeds.
    #[must_use]
    pub fn new(version: String, feeds: Vec<Arc<FeedState>>, hub: SharedSampleHub) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            feeds,
            hub,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Health check HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/healthz", get(liveness_handler))
            .route("/readyz", get(readiness_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);

    // Ready if at least one feed is connected
    let is_ready = response.feeds.iter().any(|f| f.connected);

    if is_ready {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let feeds: Vec<FeedInfo> = state
        .feeds
        .iter()
        .map(|feed| FeedInfo::from(feed.status()))
        .collect();

    let status = determine_health_status(&feeds);

    HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        feeds,
        subscribers: SubscriberStatus::from(state.hub.stats()),
    }
}

fn determine_health_status(feeds: &[FeedInfo]) -> HealthStatus {
    let connected_count = feeds.iter().filter(|f| f.connected).count();

    if !feeds.is_empty() && connected_count == feeds.len() {
        HealthStatus::Healthy
    } else if connected_count > 0 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Unhealthy
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_info(feed: FeedKind, connected: bool) -> FeedInfo {
        FeedInfo {
            feed,
            state: if connected {
                ConnectionState::Open
            } else {
                ConnectionState::Closed
            },
            connected,
            samples_received: if connected { 100 } else { 0 },
            frames_dropped: 0,
            reconnect_attempts: if connected { 0 } else { 5 },
            last_connected_at: None,
            error: None,
        }
    }

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn determine_status_all_connected() {
        let feeds = vec![
            make_info(FeedKind::Live, true),
            make_info(FeedKind::Demo, true),
        ];
        assert_eq!(determine_health_status(&feeds), HealthStatus::Healthy);
    }

    #[test]
    fn determine_status_partial() {
        let feeds = vec![
            make_info(FeedKind::Live, false),
            make_info(FeedKind::Demo, true),
        ];
        assert_eq!(determine_health_status(&feeds), HealthStatus::Degraded);
    }

    #[test]
    fn determine_status_none_connected() {
        let feeds = vec![
            make_info(FeedKind::Live, false),
            make_info(FeedKind::Demo, false),
        ];
        assert_eq!(determine_health_status(&feeds), HealthStatus::Unhealthy);
    }

    #[test]
    fn determine_status_no_feeds_is_unhealthy() {
        assert_eq!(determine_health_status(&[]), HealthStatus::Unhealthy);
    }

    #[test]
    fn feed_info_derives_connected_from_state() {
        let state = FeedState::new(FeedKind::Live);
        state.set_state(ConnectionState::Open);
        state.add_samples(7);

        let info = FeedInfo::from(state.status());
        assert!(info.connected);
        assert_eq!(info.samples_received, 7);
        assert_eq!(info.feed, FeedKind::Live);
    }
}
