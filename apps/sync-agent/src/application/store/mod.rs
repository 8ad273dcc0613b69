//! Record Store
//!
//! The client-side copy of the shared record collection, its mirrored
//! version counter, and the mutation protocol around them. Every
//! mutation carries the last-observed version; when the server reports
//! a conflict the store hands the rejected edit to the
//! [`ConflictResolver`] instead of applying a local guess, and the
//! collection is left untouched until the user adjudicates.
//!
//! # Concurrency
//!
//! Mutations are not pipelined: a permit rejects a second submit while
//! one is in flight. No data lock is held across a network round trip;
//! state is re-read after the response settles.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::ports::{ApiError, RecordApi, RecordUpdate};
use crate::domain::conflict::{ConflictPhase, ConflictResolver, PendingEdit};
use crate::domain::records::{AccountRecord, DeskSummary, RecordCollection, RecordPatch};

// =============================================================================
// Errors
// =============================================================================

/// Why a store operation did not go through.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A prior mutation has not settled yet; submit again once it has.
    #[error("another change is still being submitted")]
    OperationPending,

    /// A version conflict is awaiting the user's choice.
    #[error("a version conflict is awaiting resolution")]
    ConflictUnresolved,

    /// The call failed with a classified API error.
    #[error(transparent)]
    Api(#[from] ApiError),
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug)]
struct StoreState {
    collection: RecordCollection,
    version: u64,
    resolver: ConflictResolver,
    last_error: Option<String>,
    network_error: bool,
}

/// Authoritative local mirror of the record collection.
///
/// One instance per process, constructed at startup and shared behind
/// an [`Arc`]; nothing else writes to the collection or the counter.
#[derive(Debug)]
pub struct RecordStore<A: RecordApi> {
    api: Arc<A>,
    state: RwLock<StoreState>,
    mutation_permit: Mutex<()>,
}

impl<A: RecordApi> RecordStore<A> {
    /// Create an empty store over the given API port.
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            state: RwLock::new(StoreState {
                collection: RecordCollection::new(),
                version: 0,
                resolver: ConflictResolver::new(),
                last_error: None,
                network_error: false,
            }),
            mutation_permit: Mutex::new(()),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The records in collection order.
    #[must_use]
    pub fn records(&self) -> Vec<AccountRecord> {
        self.state.read().collection.records().to_vec()
    }

    /// Look up one record by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<AccountRecord> {
        self.state.read().collection.get(key).cloned()
    }

    /// The last version counter observed from the server.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    /// Aggregate figures over the collection.
    #[must_use]
    pub fn summary(&self) -> DeskSummary {
        self.state.read().collection.summary()
    }

    /// The dismissible error message, if one is showing.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Whether the last failure was a connectivity failure. Stays set
    /// until a call succeeds.
    #[must_use]
    pub fn is_network_error(&self) -> bool {
        self.state.read().network_error
    }

    /// Dismiss the error message. The network flag is cleared only by
    /// a successful call.
    pub fn clear_error(&self) {
        self.state.write().last_error = None;
    }

    /// Phase of the conflict state machine.
    #[must_use]
    pub fn conflict_phase(&self) -> ConflictPhase {
        self.state.read().resolver.phase()
    }

    /// Whether a conflict is awaiting adjudication or refresh.
    #[must_use]
    pub fn has_conflict(&self) -> bool {
        !self.state.read().resolver.is_idle()
    }

    /// The edit held by an outstanding conflict.
    #[must_use]
    pub fn pending_edit(&self) -> Option<PendingEdit> {
        self.state.read().resolver.pending_edit().cloned()
    }

    // -------------------------------------------------------------------------
    // Synchronization
    // -------------------------------------------------------------------------

    /// Replace the collection wholesale from the server, resetting any
    /// version drift. Idempotent; safe to call at any time.
    ///
    /// # Errors
    ///
    /// Returns the classified API failure; the collection is untouched
    /// on failure.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        match self.api.fetch_all().await {
            Ok(snapshot) => {
                let mut state = self.state.write();
                debug!(
                    records = snapshot.records.len(),
                    version = snapshot.version,
                    "collection refreshed"
                );
                state.collection = RecordCollection::from_records(snapshot.records);
                state.version = snapshot.version;
                state.network_error = false;
                Ok(())
            }
            Err(err) => {
                self.note_failure(&err);
                Err(err.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Create a record. On success the record joins the collection and
    /// the counter advances to the server-reported value.
    ///
    /// # Errors
    ///
    /// [`StoreError::OperationPending`] while another mutation is in
    /// flight, [`StoreError::ConflictUnresolved`] while a conflict is
    /// open, otherwise the classified API failure.
    pub async fn create(&self, record: AccountRecord) -> Result<(), StoreError> {
        let _permit = self.acquire_permit()?;
        let expected = self.begin_mutation()?;

        match self.api.create(&record, expected).await {
            Ok(version) => {
                let mut state = self.state.write();
                if !state.collection.insert(record.clone()) {
                    state.collection.replace(record);
                }
                state.version = version;
                state.network_error = false;
                Ok(())
            }
            Err(err) => {
                self.route_failure(&err, move || PendingEdit::Create(record));
                Err(err.into())
            }
        }
    }

    /// Patch the record with this key. On success the server's full
    /// row replaces the local one in place and the counter advances.
    ///
    /// # Errors
    ///
    /// Same contract as [`create`](Self::create).
    pub async fn update(&self, key: &str, patch: RecordPatch) -> Result<AccountRecord, StoreError> {
        let _permit = self.acquire_permit()?;
        let expected = self.begin_mutation()?;

        match self.api.update(key, &patch, expected).await {
            Ok(RecordUpdate { record, version }) => {
                let mut state = self.state.write();
                if !state.collection.replace(record.clone()) {
                    state.collection.insert(record.clone());
                }
                state.version = version;
                state.network_error = false;
                Ok(record)
            }
            Err(err) => {
                self.route_failure(&err, move || PendingEdit::Update {
                    key: key.to_string(),
                    patch,
                });
                Err(err.into())
            }
        }
    }

    /// Delete the record with this key. On success the matching entry
    /// leaves the collection and the counter advances.
    ///
    /// # Errors
    ///
    /// Same contract as [`create`](Self::create).
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _permit = self.acquire_permit()?;
        let expected = self.begin_mutation()?;

        match self.api.delete(key, expected).await {
            Ok(version) => {
                let mut state = self.state.write();
                state.collection.remove(key);
                state.version = version;
                state.network_error = false;
                Ok(())
            }
            Err(err) => {
                self.route_failure(&err, || PendingEdit::Delete {
                    key: key.to_string(),
                });
                Err(err.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Conflict resolution
    // -------------------------------------------------------------------------

    /// Resolve the open conflict by refetching the authoritative
    /// collection, then discard the held edit.
    ///
    /// Duplicate calls while the refresh is running are no-ops, as is
    /// calling with no conflict open. If the refresh itself fails the
    /// conflict stays open so the user can retry or cancel.
    ///
    /// # Errors
    ///
    /// The classified failure of the refresh fetch.
    pub async fn resolve_with_refresh(&self) -> Result<(), StoreError> {
        if !self.state.write().resolver.begin_refresh() {
            return Ok(());
        }

        match self.api.fetch_all().await {
            Ok(snapshot) => {
                let mut state = self.state.write();
                state.collection = RecordCollection::from_records(snapshot.records);
                state.version = snapshot.version;
                state.network_error = false;
                let _discarded = state.resolver.finish_refresh();
                debug!(version = state.version, "conflict resolved by refresh");
                Ok(())
            }
            Err(err) => {
                self.state.write().resolver.abort_refresh();
                self.note_failure(&err);
                warn!(error = %err, "conflict refresh failed; conflict still open");
                Err(err.into())
            }
        }
    }

    /// Resolve the open conflict by discarding the held edit without
    /// refetching. Returns `false` if there was nothing to cancel.
    pub fn resolve_with_cancel(&self) -> bool {
        self.state.write().resolver.cancel().is_some()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn acquire_permit(&self) -> Result<tokio::sync::MutexGuard<'_, ()>, StoreError> {
        self.mutation_permit
            .try_lock()
            .map_err(|_| StoreError::OperationPending)
    }

    /// Gate mutations on an idle resolver and capture the version the
    /// server will be told to expect.
    fn begin_mutation(&self) -> Result<u64, StoreError> {
        let state = self.state.read();
        if !state.resolver.is_idle() {
            return Err(StoreError::ConflictUnresolved);
        }
        Ok(state.version)
    }

    /// Conflicts go to the resolver with the rejected edit; everything
    /// else goes to the dismissible message channel.
    fn route_failure(&self, err: &ApiError, edit: impl FnOnce() -> PendingEdit) {
        if let ApiError::Conflict { server_version, .. } = err {
            let mut state = self.state.write();
            state.resolver.detect(edit(), *server_version);
            warn!(server_version = ?server_version, "mutation rejected: version conflict");
        } else {
            self.note_failure(err);
        }
    }

    fn note_failure(&self, err: &ApiError) {
        let mut state = self.state.write();
        state.last_error = Some(err.to_string());
        if err.is_network() {
            state.network_error = true;
        }
    }
}
