//! Conflict Resolution State Machine
//!
//! After a versioned mutation is rejected because the server's counter
//! moved past the client's, the rejected edit is held here until the
//! user adjudicates: refresh from the server (discarding the edit) or
//! cancel (discard without refetching). No silent merge is attempted;
//! the figures are financial and a stale overwrite must be visible.
//!
//! Phases: `Idle -> ConflictDetected -> { Refreshing -> Idle | Idle }`.
//! While a refresh is in flight, duplicate refresh requests are no-ops
//! rather than queued.

use crate::domain::records::{AccountRecord, RecordKey, RecordPatch};

// =============================================================================
// Types
// =============================================================================

/// The mutation that was rejected with a version conflict.
///
/// Held unapplied until the user decides; never re-submitted
/// automatically.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingEdit {
    /// A rejected create, with the draft that was sent.
    Create(AccountRecord),
    /// A rejected update.
    Update {
        /// Key of the record being edited.
        key: RecordKey,
        /// The fields that were to change.
        patch: RecordPatch,
    },
    /// A rejected delete.
    Delete {
        /// Key of the record being removed.
        key: RecordKey,
    },
}

/// Resolver phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPhase {
    /// No conflict outstanding.
    #[default]
    Idle,
    /// A conflict is awaiting the user's choice.
    ConflictDetected,
    /// The refresh path is running; further refresh requests are no-ops.
    Refreshing,
}

// =============================================================================
// Resolver
// =============================================================================

/// State machine for version-conflict adjudication.
///
/// One instance per record store. Transitions are synchronous; the
/// store drives them around its own async refresh call.
#[derive(Debug, Default)]
pub struct ConflictResolver {
    phase: ConflictPhase,
    pending: Option<PendingEdit>,
    server_version: Option<u64>,
}

impl ConflictResolver {
    /// Create a resolver in the idle phase.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: ConflictPhase::Idle,
            pending: None,
            server_version: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ConflictPhase {
        self.phase
    }

    /// Whether no conflict is outstanding.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.phase == ConflictPhase::Idle
    }

    /// Whether a refresh is currently in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.phase == ConflictPhase::Refreshing
    }

    /// The held edit, while one is outstanding.
    #[must_use]
    pub const fn pending_edit(&self) -> Option<&PendingEdit> {
        self.pending.as_ref()
    }

    /// The server's counter as reported by the rejecting response.
    #[must_use]
    pub const fn server_version(&self) -> Option<u64> {
        self.server_version
    }

    /// Enter `ConflictDetected`, holding the rejected edit.
    ///
    /// Only valid from `Idle`; returns `false` (dropping nothing) if a
    /// conflict is already being adjudicated.
    pub fn detect(&mut self, edit: PendingEdit, server_version: Option<u64>) -> bool {
        if self.phase != ConflictPhase::Idle {
            return false;
        }
        self.phase = ConflictPhase::ConflictDetected;
        self.pending = Some(edit);
        self.server_version = server_version;
        true
    }

    /// Start the refresh path.
    ///
    /// Returns `true` when the transition happened. Returns `false`
    /// from `Refreshing` (duplicate request while loading) and from
    /// `Idle` (nothing to refresh for).
    pub fn begin_refresh(&mut self) -> bool {
        if self.phase != ConflictPhase::ConflictDetected {
            return false;
        }
        self.phase = ConflictPhase::Refreshing;
        true
    }

    /// Complete the refresh path: discard the held edit and return to
    /// `Idle`. Returns the discarded edit, or `None` when no refresh
    /// was in flight.
    pub fn finish_refresh(&mut self) -> Option<PendingEdit> {
        if self.phase != ConflictPhase::Refreshing {
            return None;
        }
        self.phase = ConflictPhase::Idle;
        self.server_version = None;
        self.pending.take()
    }

    /// Refresh failed: keep holding the edit and return to
    /// `ConflictDetected` so the user can retry or cancel.
    pub fn abort_refresh(&mut self) -> bool {
        if self.phase != ConflictPhase::Refreshing {
            return false;
        }
        self.phase = ConflictPhase::ConflictDetected;
        true
    }

    /// Discard the held edit without refetching and return to `Idle`.
    ///
    /// Only valid from `ConflictDetected`; while a refresh is in
    /// flight the choice buttons are disabled, so `Refreshing` rejects
    /// the cancel.
    pub fn cancel(&mut self) -> Option<PendingEdit> {
        if self.phase != ConflictPhase::ConflictDetected {
            return None;
        }
        self.phase = ConflictPhase::Idle;
        self.server_version = None;
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit() -> PendingEdit {
        PendingEdit::Delete {
            key: "AK1".to_string(),
        }
    }

    #[test]
    fn starts_idle_with_no_pending_edit() {
        let resolver = ConflictResolver::new();
        assert!(resolver.is_idle());
        assert!(resolver.pending_edit().is_none());
        assert!(resolver.server_version().is_none());
    }

    #[test]
    fn detect_holds_the_rejected_edit() {
        let mut resolver = ConflictResolver::new();
        assert!(resolver.detect(edit(), Some(4)));

        assert_eq!(resolver.phase(), ConflictPhase::ConflictDetected);
        assert_eq!(resolver.pending_edit(), Some(&edit()));
        assert_eq!(resolver.server_version(), Some(4));
    }

    #[test]
    fn detect_while_adjudicating_is_rejected() {
        let mut resolver = ConflictResolver::new();
        assert!(resolver.detect(edit(), Some(4)));
        assert!(!resolver.detect(
            PendingEdit::Delete {
                key: "AK2".to_string()
            },
            Some(5)
        ));
        // The original edit is still the one held.
        assert_eq!(resolver.pending_edit(), Some(&edit()));
    }

    #[test]
    fn begin_refresh_requires_a_detected_conflict() {
        let mut resolver = ConflictResolver::new();
        assert!(!resolver.begin_refresh());

        resolver.detect(edit(), None);
        assert!(resolver.begin_refresh());
        assert!(resolver.is_refreshing());
    }

    #[test]
    fn duplicate_refresh_requests_are_noops() {
        let mut resolver = ConflictResolver::new();
        resolver.detect(edit(), None);
        assert!(resolver.begin_refresh());
        assert!(!resolver.begin_refresh());
        assert!(resolver.is_refreshing());
    }

    #[test]
    fn finish_refresh_discards_edit_and_returns_to_idle() {
        let mut resolver = ConflictResolver::new();
        resolver.detect(edit(), Some(7));
        resolver.begin_refresh();

        let discarded = resolver.finish_refresh();
        assert_eq!(discarded, Some(edit()));
        assert!(resolver.is_idle());
        assert!(resolver.pending_edit().is_none());
        assert!(resolver.server_version().is_none());
    }

    #[test]
    fn finish_refresh_without_refresh_in_flight_is_noop() {
        let mut resolver = ConflictResolver::new();
        assert!(resolver.finish_refresh().is_none());

        resolver.detect(edit(), None);
        assert!(resolver.finish_refresh().is_none());
        assert_eq!(resolver.phase(), ConflictPhase::ConflictDetected);
    }

    #[test]
    fn abort_refresh_keeps_the_conflict_standing() {
        let mut resolver = ConflictResolver::new();
        resolver.detect(edit(), Some(4));
        resolver.begin_refresh();

        assert!(resolver.abort_refresh());
        assert_eq!(resolver.phase(), ConflictPhase::ConflictDetected);
        assert_eq!(resolver.pending_edit(), Some(&edit()));
    }

    #[test]
    fn cancel_discards_without_refetching() {
        let mut resolver = ConflictResolver::new();
        resolver.detect(edit(), Some(4));

        let discarded = resolver.cancel();
        assert_eq!(discarded, Some(edit()));
        assert!(resolver.is_idle());
    }

    #[test]
    fn cancel_is_disabled_while_refreshing() {
        let mut resolver = ConflictResolver::new();
        resolver.detect(edit(), None);
        resolver.begin_refresh();

        assert!(resolver.cancel().is_none());
        assert!(resolver.is_refreshing());
    }

    #[test]
    fn full_refresh_lifecycle() {
        let mut resolver = ConflictResolver::new();

        resolver.detect(
            PendingEdit::Update {
                key: "AK1".to_string(),
                patch: RecordPatch::default().with_user("ana"),
            },
            Some(9),
        );
        assert!(resolver.begin_refresh());
        assert!(resolver.finish_refresh().is_some());

        // A new conflict can now be adjudicated from scratch.
        assert!(resolver.detect(edit(), Some(10)));
    }
}
