//! Failure classification for the record API.
//!
//! Maps transport failures and HTTP error statuses onto [`ApiError`] so
//! the rest of the agent only ever sees the four classified shapes:
//! `Network`, `Conflict`, `Server`, and `Decode`.

use reqwest::StatusCode;

use crate::application::ports::ApiError;

use super::types::ErrorBody;

/// Classify a transport-level failure, where no usable HTTP response
/// was received.
pub fn classify_transport(err: &reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode {
            message: err.to_string(),
        }
    } else {
        ApiError::Network {
            message: err.to_string(),
        }
    }
}

/// Classify a non-2xx HTTP response.
///
/// The conflict status carries the server's current version in its body
/// so the caller can report how far ahead the server is. Every other
/// status becomes a plain server error with whatever detail the body
/// offers.
#[must_use]
pub fn classify_status(status: StatusCode, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let detail = parsed.detail.unwrap_or_else(|| {
        if body.is_empty() {
            status.to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::CONFLICT {
        ApiError::Conflict {
            server_version: parsed.version,
            detail,
        }
    } else {
        ApiError::Server {
            status: status.as_u16(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(StatusCode::BAD_REQUEST, r#"{"detail": "Duplicate key"}"#, 400, "Duplicate key"; "duplicate key")]
    #[test_case(StatusCode::NOT_FOUND, r#"{"detail": "Entry not found"}"#, 404, "Entry not found"; "missing entry")]
    #[test_case(StatusCode::UNAUTHORIZED, "", 401, "401 Unauthorized"; "auth failure")]
    #[test_case(StatusCode::INTERNAL_SERVER_ERROR, "boom", 500, "boom"; "unparseable body")]
    fn non_conflict_statuses_classify_as_server(
        status: StatusCode,
        body: &str,
        want_status: u16,
        want_detail: &str,
    ) {
        match classify_status(status, body) {
            ApiError::Server { status, detail } => {
                assert_eq!(status, want_status);
                assert_eq!(detail, want_detail);
            }
            other => panic!("expected Server error, got {other:?}"),
        }
    }

    #[test]
    fn conflict_carries_server_version() {
        let body = r#"{"detail": "the data changed", "version": 12}"#;

        match classify_status(StatusCode::CONFLICT, body) {
            ApiError::Conflict {
                server_version,
                detail,
            } => {
                assert_eq!(server_version, Some(12));
                assert_eq!(detail, "the data changed");
            }
            other => panic!("expected Conflict error, got {other:?}"),
        }
    }

    #[test]
    fn conflict_without_body_still_classifies() {
        match classify_status(StatusCode::CONFLICT, "") {
            ApiError::Conflict {
                server_version,
                detail,
            } => {
                assert_eq!(server_version, None);
                assert_eq!(detail, "409 Conflict");
            }
            other => panic!("expected Conflict error, got {other:?}"),
        }
    }

    #[test]
    fn conflict_is_routable() {
        let err = classify_status(StatusCode::CONFLICT, r#"{"version": 3}"#);
        assert!(err.is_conflict());
        assert_eq!(err.server_version(), Some(3));
    }
}
