//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! The record API is the only driven port: everything the store needs
//! from the backend goes through it, so tests can swap in scripted
//! implementations.

mod record_api;

pub use record_api::{ApiError, CollectionSnapshot, RecordApi, RecordUpdate};
