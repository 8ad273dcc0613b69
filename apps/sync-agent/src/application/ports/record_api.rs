//! Record API Port (Driven Port)
//!
//! Interface for the versioned record collection endpoints. The store
//! talks to the backend only through this trait; the HTTP adapter
//! lives in the infrastructure layer and classification of its
//! failures into [`ApiError`] happens there.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::records::{AccountRecord, RecordPatch};

/// Full collection as fetched from the server, with its counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    /// All records in server order.
    pub records: Vec<AccountRecord>,
    /// The server's version counter at fetch time.
    pub version: u64,
}

/// Result of an accepted update: the authoritative row and the
/// advanced counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// The full record as the server now holds it.
    pub record: AccountRecord,
    /// The server's version counter after the mutation.
    pub version: u64,
}

/// Classified failure of a record API call.
///
/// `Network` means no response was received at all; everything else
/// means the server answered. Conflicts carry the server's counter
/// when the rejecting response included it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No response received; connectivity problem.
    #[error("unable to reach the server: {message}")]
    Network {
        /// Underlying transport error.
        message: String,
    },

    /// The server's counter moved past the client's.
    #[error("version conflict: the data changed on the server ({detail})")]
    Conflict {
        /// The server's current counter, when reported.
        server_version: Option<u64>,
        /// Server-provided detail.
        detail: String,
    },

    /// Any other error response (validation, auth, server fault).
    #[error("server rejected the request ({status}): {detail}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided detail.
        detail: String,
    },

    /// The response arrived but its body was not the expected shape.
    #[error("malformed server response: {message}")]
    Decode {
        /// Parse failure description.
        message: String,
    },
}

impl ApiError {
    /// Whether this is a connectivity failure (no response at all).
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Whether this is a version conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether the server answered with a non-conflict rejection.
    #[must_use]
    pub const fn is_server(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Decode { .. })
    }

    /// The server's counter from a conflict rejection.
    #[must_use]
    pub const fn server_version(&self) -> Option<u64> {
        match self {
            Self::Conflict { server_version, .. } => *server_version,
            _ => None,
        }
    }
}

/// Port for the record collection endpoints.
///
/// Mutations carry the client's last-observed version so the server
/// can reject stale writes.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Fetch the whole collection and the server's counter.
    async fn fetch_all(&self) -> Result<CollectionSnapshot, ApiError>;

    /// Create a record. Returns the advanced counter.
    async fn create(&self, record: &AccountRecord, expected_version: u64)
    -> Result<u64, ApiError>;

    /// Patch the record with this key. Returns the authoritative row
    /// and the advanced counter.
    async fn update(
        &self,
        key: &str,
        patch: &RecordPatch,
        expected_version: u64,
    ) -> Result<RecordUpdate, ApiError>;

    /// Delete the record with this key. Returns the advanced counter.
    async fn delete(&self, key: &str, expected_version: u64) -> Result<u64, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_exposes_server_version() {
        let err = ApiError::Conflict {
            server_version: Some(7),
            detail: "stale version".to_string(),
        };
        assert!(err.is_conflict());
        assert!(!err.is_network());
        assert_eq!(err.server_version(), Some(7));
    }

    #[test]
    fn network_and_server_are_distinct_classes() {
        let network = ApiError::Network {
            message: "connection refused".to_string(),
        };
        assert!(network.is_network());
        assert!(!network.is_server());
        assert_eq!(network.server_version(), None);

        let server = ApiError::Server {
            status: 400,
            detail: "API key already exists".to_string(),
        };
        assert!(server.is_server());
        assert!(!server.is_network());
        assert!(!server.is_conflict());
    }

    #[test]
    fn display_carries_the_server_detail() {
        let err = ApiError::Server {
            status: 404,
            detail: "Entry not found".to_string(),
        };
        assert!(err.to_string().contains("Entry not found"));
        assert!(err.to_string().contains("404"));
    }
}
