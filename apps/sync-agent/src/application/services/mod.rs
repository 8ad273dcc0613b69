//! Application Services
//!
//! Long-running services that sit between the transports and the shared
//! state. The feed service projects transport events onto the buffer and
//! connection state; the demo feed stands in for the live transport when
//! no endpoint is configured; the record sync service refetches the
//! collection on a cadence.

mod demo;
mod feed;
mod sync;

pub use demo::{DemoFeed, DemoFeedConfig};
pub use feed::FeedService;
pub use sync::{RecordSyncConfig, RecordSyncService};
