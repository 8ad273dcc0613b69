#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Deskboard Sync Agent - Dashboard Data Synchronizer
//!
//! A sync service that maintains a single connection to the dashboard's
//! WebSocket feed, mirrors pushed metric samples into rolling chart
//! buffers, and keeps account records consistent with the REST API using
//! version-checked mutations.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core data types and rules with no external dependencies
//!   - `timeseries`: Metric samples and rolling chart buffers
//!   - `records`: Account records, patches, and the keyed collection
//!   - `conflict`: Version conflict detection and resolution choices
//!   - `connection`: Feed connection lifecycle and counters
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Interface for the record API
//!   - `store`: Version-tracked record cache and mutation flow
//!   - `services`: Feed event processing, demo samples, background sync
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `stream`: WebSocket feed client with reconnection
//!   - `api`: HTTP record API client
//!   - `broadcast`: Channel-based sample distribution
//!   - `config`: Environment-driven configuration
//!   - `health`: Health check HTTP endpoint
//!   - `metrics`: Prometheus instrumentation
//!   - `telemetry`: Tracing and OTLP export
//!
//! # Data Flow
//!
//! ```text
//! Dashboard WS ──┐
//!                │     ┌─────────────┐     ┌─────────────┐
//!                ├────►│    Feed     │────►│  Broadcast  │──► Subscriber 1
//! Demo ticker  ──┘     │   Service   │     │   Channels  │──► Subscriber N
//!                      └──────┬──────┘     └─────────────┘
//!                             ▼
//!                      chart buffers
//!
//! Record API HTTP ◄──► Record Store (versioned reads and mutations)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core data types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::conflict::{ConflictPhase, ConflictResolver, PendingEdit};
pub use domain::connection::{ConnectionState, FeedKind, FeedState, FeedStatus};
pub use domain::records::{AccountRecord, DeskSummary, RecordCollection, RecordKey, RecordPatch};
pub use domain::timeseries::{FeedEvent, Sample, SeriesBuffer, WINDOW_SIZE};

// Application ports and services
pub use application::ports::{ApiError, CollectionSnapshot, RecordApi, RecordUpdate};
pub use application::services::{
    DemoFeed, DemoFeedConfig, FeedService, RecordSyncConfig, RecordSyncService,
};
pub use application::store::{RecordStore, StoreError};

// Infrastructure config
pub use infrastructure::config::{AgentConfig, ConfigError, ReconnectSettings, SessionToken};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Broadcast hub (for integration tests)
pub use infrastructure::broadcast::{
    ConnectionBroadcast, HubConfig, HubStats, SampleBroadcast, SampleHub, SharedSampleHub,
};

// Stream client (for integration tests)
pub use infrastructure::stream::{
    CodecError, FrameCodec, ReconnectConfig, ReconnectPolicy, StreamClient, StreamClientConfig,
    StreamError, StreamFrame,
};

// Record API client (for integration tests)
pub use infrastructure::api::{EXPECTED_VERSION_HEADER, HttpRecordApi, RecordApiConfig};

// Metrics
pub use infrastructure::metrics::{MutationKind, MutationOutcome, init_metrics};

// Telemetry
pub use infrastructure::telemetry::{
    LogFormat, TelemetryConfig, TelemetryGuard, init as init_telemetry,
};
