//! Account Record Types
//!
//! Domain types for the shared record collection: one row per broker
//! API key with its financial figures, the ordered collection keyed by
//! that field, and the partial-update shape sent on edits.
//!
//! # Design
//!
//! The key field (`API key`) is immutable after creation and unique
//! across the collection. The secret is write-only: it travels to the
//! server on create/update but is never logged, and is skipped from
//! serialization when absent. Money fields use [`Decimal`] with string
//! serde so no precision is lost crossing the wire.

use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Types
// =============================================================================

/// The unique key field of a record (a broker API key).
pub type RecordKey = String;

/// One row of the shared record set.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Display name of the owning user.
    pub user: String,
    /// Brokerage the key belongs to.
    pub broker: String,
    /// Unique key field; immutable after creation.
    #[serde(rename = "API key")]
    pub api_key: RecordKey,
    /// Write-only secret; omitted from responses and redacted from Debug.
    #[serde(rename = "API secret", default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    /// Profit and loss.
    #[serde(with = "rust_decimal::serde::str")]
    pub pnl: Decimal,
    /// Margin in use.
    #[serde(with = "rust_decimal::serde::str")]
    pub margin: Decimal,
    /// Maximum tolerated risk.
    #[serde(with = "rust_decimal::serde::str")]
    pub max_risk: Decimal,
}

impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("user", &self.user)
            .field("broker", &self.broker)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("pnl", &self.pnl)
            .field("margin", &self.margin)
            .field("max_risk", &self.max_risk)
            .finish()
    }
}

/// Partial update for a record; the key itself is never patched.
///
/// Only the populated fields are serialized, so the server applies the
/// patch on top of its authoritative row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    /// New user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// New broker name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker: Option<String>,
    /// Replacement secret.
    #[serde(rename = "API secret", default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    /// New profit and loss.
    #[serde(with = "rust_decimal::serde::str_option", default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,
    /// New margin.
    #[serde(with = "rust_decimal::serde::str_option", default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<Decimal>,
    /// New maximum risk.
    #[serde(with = "rust_decimal::serde::str_option", default, skip_serializing_if = "Option::is_none")]
    pub max_risk: Option<Decimal>,
}

impl RecordPatch {
    /// Patch only the PNL field.
    #[must_use]
    pub const fn pnl(value: Decimal) -> Self {
        Self {
            user: None,
            broker: None,
            api_secret: None,
            pnl: Some(value),
            margin: None,
            max_risk: None,
        }
    }

    /// Set the user field.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the broker field.
    #[must_use]
    pub fn with_broker(mut self, broker: impl Into<String>) -> Self {
        self.broker = Some(broker.into());
        self
    }

    /// Set the margin field.
    #[must_use]
    pub const fn with_margin(mut self, margin: Decimal) -> Self {
        self.margin = Some(margin);
        self
    }

    /// Set the maximum risk field.
    #[must_use]
    pub const fn with_max_risk(mut self, max_risk: Decimal) -> Self {
        self.max_risk = Some(max_risk);
        self
    }

    /// Whether the patch carries no fields at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.broker.is_none()
            && self.api_secret.is_none()
            && self.pnl.is_none()
            && self.margin.is_none()
            && self.max_risk.is_none()
    }
}

// =============================================================================
// Collection
// =============================================================================

/// Ordered collection of records, unique by key.
///
/// Mutated only from confirmed server responses; the collection itself
/// performs no network validation, it just upholds ordering and key
/// uniqueness locally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    records: Vec<AccountRecord>,
}

impl RecordCollection {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Build from a server-fetched list, preserving its order.
    #[must_use]
    pub fn from_records(records: Vec<AccountRecord>) -> Self {
        Self { records }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AccountRecord> {
        self.records.iter().find(|r| r.api_key == key)
    }

    /// Whether a record with this key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Append a record. Returns `false` (and leaves the collection
    /// untouched) if the key is already present.
    pub fn insert(&mut self, record: AccountRecord) -> bool {
        if self.contains_key(&record.api_key) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Replace the record with the same key in place, preserving its
    /// position. Returns `false` if no such key exists.
    pub fn replace(&mut self, record: AccountRecord) -> bool {
        match self.records.iter_mut().find(|r| r.api_key == record.api_key) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Remove a record by key, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<AccountRecord> {
        let index = self.records.iter().position(|r| r.api_key == key)?;
        Some(self.records.remove(index))
    }

    /// The records in collection order.
    #[must_use]
    pub fn records(&self) -> &[AccountRecord] {
        &self.records
    }

    /// Aggregate the collection into the dashboard's header figures.
    #[must_use]
    pub fn summary(&self) -> DeskSummary {
        let users: HashSet<&str> = self.records.iter().map(|r| r.user.as_str()).collect();
        DeskSummary {
            total_pnl: self.records.iter().map(|r| r.pnl).sum(),
            total_margin: self.records.iter().map(|r| r.margin).sum(),
            total_max_risk: self.records.iter().map(|r| r.max_risk).sum(),
            record_count: self.records.len(),
            active_users: users.len(),
        }
    }
}

/// Aggregated figures over the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeskSummary {
    /// Sum of all PNL fields.
    pub total_pnl: Decimal,
    /// Sum of all margin fields.
    pub total_margin: Decimal,
    /// Sum of all max-risk fields.
    pub total_max_risk: Decimal,
    /// Number of records.
    pub record_count: usize,
    /// Number of distinct user names.
    pub active_users: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn record(key: &str, user: &str, pnl: Decimal) -> AccountRecord {
        AccountRecord {
            user: user.to_string(),
            broker: "alpaca".to_string(),
            api_key: key.to_string(),
            api_secret: None,
            pnl,
            margin: Decimal::new(500, 0),
            max_risk: Decimal::new(1000, 0),
        }
    }

    #[test]
    fn serde_uses_spaced_field_names() {
        let mut rec = record("AK1", "ana", dec("100.5"));
        rec.api_secret = Some("shh".to_string());

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["API key"], "AK1");
        assert_eq!(json["API secret"], "shh");
        assert_eq!(json["pnl"], "100.5");
    }

    #[test]
    fn serde_skips_absent_secret() {
        let json = serde_json::to_value(record("AK1", "ana", Decimal::new(1, 0))).unwrap();
        assert!(json.get("API secret").is_none());
    }

    #[test]
    fn deserializes_without_secret() {
        let json = r#"{"user":"ana","broker":"alpaca","API key":"AK1","pnl":"10","margin":"20","max_risk":"30"}"#;
        let rec: AccountRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.api_key, "AK1");
        assert!(rec.api_secret.is_none());
    }

    #[test]
    fn debug_redacts_secret() {
        let mut rec = record("AK1", "ana", Decimal::new(1, 0));
        rec.api_secret = Some("super_secret".to_string());
        let debug = format!("{rec:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super_secret"));
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = RecordPatch::pnl(Decimal::new(150, 0));
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["pnl"], "150");
        assert!(json.get("user").is_none());
        assert!(json.get("margin").is_none());
    }

    #[test]
    fn patch_builder_chains() {
        let patch = RecordPatch::default()
            .with_user("bo")
            .with_broker("ibkr")
            .with_margin(Decimal::new(750, 0));
        assert_eq!(patch.user.as_deref(), Some("bo"));
        assert_eq!(patch.broker.as_deref(), Some("ibkr"));
        assert_eq!(patch.margin, Some(Decimal::new(750, 0)));
        assert!(!patch.is_empty());
        assert!(RecordPatch::default().is_empty());
    }

    #[test]
    fn insert_rejects_duplicate_key() {
        let mut collection = RecordCollection::new();
        assert!(collection.insert(record("AK1", "ana", Decimal::new(1, 0))));
        assert!(!collection.insert(record("AK1", "bo", Decimal::new(2, 0))));
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("AK1").map(|r| r.user.as_str()), Some("ana"));
    }

    #[test]
    fn replace_preserves_position() {
        let mut collection = RecordCollection::from_records(vec![
            record("AK1", "ana", Decimal::new(1, 0)),
            record("AK2", "bo", Decimal::new(2, 0)),
            record("AK3", "cy", Decimal::new(3, 0)),
        ]);

        assert!(collection.replace(record("AK2", "bo", Decimal::new(20, 0))));
        let keys: Vec<&str> = collection.records().iter().map(|r| r.api_key.as_str()).collect();
        assert_eq!(keys, vec!["AK1", "AK2", "AK3"]);
        assert_eq!(collection.get("AK2").map(|r| r.pnl), Some(Decimal::new(20, 0)));
    }

    #[test]
    fn replace_missing_key_is_noop() {
        let mut collection = RecordCollection::from_records(vec![record("AK1", "ana", Decimal::new(1, 0))]);
        assert!(!collection.replace(record("AK9", "zz", Decimal::new(9, 0))));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn remove_returns_the_record() {
        let mut collection = RecordCollection::from_records(vec![
            record("AK1", "ana", Decimal::new(1, 0)),
            record("AK2", "bo", Decimal::new(2, 0)),
        ]);

        let removed = collection.remove("AK1");
        assert_eq!(removed.map(|r| r.api_key), Some("AK1".to_string()));
        assert_eq!(collection.len(), 1);
        assert!(collection.remove("AK1").is_none());
    }

    #[test]
    fn summary_aggregates_collection() {
        let collection = RecordCollection::from_records(vec![
            record("AK1", "ana", Decimal::new(100, 0)),
            record("AK2", "ana", Decimal::new(-40, 0)),
            record("AK3", "bo", Decimal::new(25, 0)),
        ]);

        let summary = collection.summary();
        assert_eq!(summary.total_pnl, Decimal::new(85, 0));
        assert_eq!(summary.total_margin, Decimal::new(1500, 0));
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.active_users, 2);
    }
}
