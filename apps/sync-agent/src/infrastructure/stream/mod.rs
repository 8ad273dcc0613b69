//! Live Feed Transport
//!
//! WebSocket client for the data service's push channel:
//!
//! - **Codec**: JSON frames, array (backlog) or object (single sample)
//! - **Reconnect**: deterministic exponential backoff with a hard budget
//! - **Client**: connection loop emitting [`crate::domain::timeseries::FeedEvent`]s

pub mod client;
pub mod codec;
pub mod reconnect;

pub use client::{StreamClient, StreamClientConfig, StreamError};
pub use codec::{CodecError, FrameCodec, StreamFrame};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
