//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// Record API HTTP client with version-checked mutations.
pub mod api;

/// Broadcast channel adapters for message distribution.
pub mod broadcast;

/// Configuration loaded from the environment.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// WebSocket feed client with frame decoding and reconnection.
pub mod stream;

/// OpenTelemetry tracing integration.
pub mod telemetry;
