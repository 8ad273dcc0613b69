//! Record API request and response types.
//!
//! These types map directly to the data service's REST format.

use serde::Deserialize;

use crate::application::ports::{CollectionSnapshot, RecordUpdate};
use crate::domain::records::AccountRecord;

/// Response from `GET /data`.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionResponse {
    /// The full record collection.
    pub records: Vec<AccountRecord>,
    /// Server version counter at the time of the read.
    pub version: u64,
}

impl CollectionResponse {
    /// Convert to a [`CollectionSnapshot`].
    #[must_use]
    pub fn into_snapshot(self) -> CollectionSnapshot {
        CollectionSnapshot {
            records: self.records,
            version: self.version,
        }
    }
}

/// Response from `POST /data` and `DELETE /data/{key}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationAck {
    /// Human-readable confirmation.
    pub message: String,
    /// Server version counter after the mutation.
    pub version: u64,
}

/// Response from `PUT /data/{key}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    /// The full record after the server applied the patch.
    pub record: AccountRecord,
    /// Server version counter after the mutation.
    pub version: u64,
}

impl UpdateResponse {
    /// Convert to a [`RecordUpdate`].
    #[must_use]
    pub fn into_update(self) -> RecordUpdate {
        RecordUpdate {
            record: self.record,
            version: self.version,
        }
    }
}

/// Error body attached to non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    #[serde(default)]
    pub detail: Option<String>,
    /// The server's current version, present on conflict responses.
    #[serde(default)]
    pub version: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_response_decodes_wire_shape() {
        let json = r#"{
            "records": [
                {"user": "ana", "broker": "alpaca", "API key": "ak-1",
                 "pnl": "125.50", "margin": "1000", "max_risk": "250"}
            ],
            "version": 7
        }"#;

        let response: CollectionResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.into_snapshot();
        assert_eq!(snapshot.version, 7);
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].user, "ana");
    }

    #[test]
    fn error_body_tolerates_missing_fields() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.detail.is_none());
        assert!(body.version.is_none());
    }

    #[test]
    fn error_body_carries_conflict_version() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail": "version mismatch", "version": 12}"#).unwrap();
        assert_eq!(body.detail.as_deref(), Some("version mismatch"));
        assert_eq!(body.version, Some(12));
    }
}
