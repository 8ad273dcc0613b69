//! Domain Layer - Core synchronization types and business logic.
//!
//! This layer contains the core types for the live feeds and the
//! shared record collection with no network dependencies. All types
//! here are pure Rust with serialization support.

/// Version-conflict adjudication state machine.
pub mod conflict;

/// Feed connection lifecycle and counters.
pub mod connection;

/// Account records, the keyed collection, and aggregates.
pub mod records;

/// Live metric samples and the sliding window.
pub mod timeseries;
