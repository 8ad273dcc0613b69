//! Record Synchronization Service
//!
//! Periodically refetches the record collection so the local mirror
//! tracks edits made from other sessions. Refreshes are skipped while a
//! version conflict is open; the resolver owns the refresh in that
//! state and the collection stays frozen until the user adjudicates.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::RecordApi;
use crate::application::store::RecordStore;

/// Configuration for the record sync service.
#[derive(Debug, Clone)]
pub struct RecordSyncConfig {
    /// Interval between collection refreshes.
    pub interval: Duration,
}

impl Default for RecordSyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Keeps the record store in step with the server.
pub struct RecordSyncService<A: RecordApi> {
    config: RecordSyncConfig,
    store: Arc<RecordStore<A>>,
    cancel: CancellationToken,
}

impl<A: RecordApi> RecordSyncService<A> {
    /// Create a new sync service.
    #[must_use]
    pub fn new(
        config: RecordSyncConfig,
        store: Arc<RecordStore<A>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            store,
            cancel,
        }
    }

    /// Refresh on the configured cadence until cancelled.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.config.interval);
        // The first tick completes immediately; the startup refresh covers it.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("Record sync shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    if self.store.has_conflict() {
                        continue;
                    }
                    if let Err(e) = self.store.refresh().await {
                        tracing::warn!(error = %e, "Periodic record refresh failed");
                    }
                }
            }
        }
    }
}
