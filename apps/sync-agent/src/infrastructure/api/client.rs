//! HTTP adapter for the record API.
//!
//! Implements the [`RecordApi`] port over reqwest. Every request carries
//! the session bearer token; mutations additionally carry the client's
//! last-observed collection version so the server can reject stale
//! writes. No automatic retry: failures are classified and surfaced
//! immediately so the owner can decide what to do.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::application::ports::{ApiError, CollectionSnapshot, RecordApi, RecordUpdate};
use crate::domain::records::{AccountRecord, RecordPatch};
use crate::infrastructure::metrics::{self, MutationKind, MutationOutcome};

use super::error::{classify_status, classify_transport};
use super::types::{CollectionResponse, MutationAck, UpdateResponse};

/// Header carrying the client's last-observed collection version.
pub const EXPECTED_VERSION_HEADER: &str = "X-Expected-Version";

/// Configuration for the record API client.
#[derive(Debug, Clone)]
pub struct RecordApiConfig {
    /// Base URL of the data service, without a trailing slash.
    pub base_url: String,
    /// Bearer token attached to every request.
    pub session_token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RecordApiConfig {
    /// Create a new configuration with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_token: session_token.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP implementation of the [`RecordApi`] port.
#[derive(Debug, Clone)]
pub struct HttpRecordApi {
    client: Client,
    base_url: String,
    session_token: String,
}

impl HttpRecordApi {
    /// Create a new client from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &RecordApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_token: config.session_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Read the body, classifying non-2xx statuses into [`ApiError`].
    async fn read_success(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| classify_transport(&e))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_status(status, &body))
        }
    }

    async fn do_fetch_all(&self) -> Result<CollectionSnapshot, ApiError> {
        let response = self
            .client
            .get(self.url("/data"))
            .bearer_auth(&self.session_token)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let body = Self::read_success(response).await?;
        let parsed: CollectionResponse = decode(&body)?;
        Ok(parsed.into_snapshot())
    }

    async fn do_create(
        &self,
        record: &AccountRecord,
        expected_version: u64,
    ) -> Result<u64, ApiError> {
        let response = self
            .client
            .post(self.url("/data"))
            .bearer_auth(&self.session_token)
            .header(EXPECTED_VERSION_HEADER, expected_version)
            .json(record)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let body = Self::read_success(response).await?;
        let ack: MutationAck = decode(&body)?;
        tracing::debug!(message = %ack.message, version = ack.version, "Record created");
        Ok(ack.version)
    }

    async fn do_update(
        &self,
        key: &str,
        patch: &RecordPatch,
        expected_version: u64,
    ) -> Result<RecordUpdate, ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/data/{key}")))
            .bearer_auth(&self.session_token)
            .header(EXPECTED_VERSION_HEADER, expected_version)
            .json(patch)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let body = Self::read_success(response).await?;
        let parsed: UpdateResponse = decode(&body)?;
        Ok(parsed.into_update())
    }

    async fn do_delete(&self, key: &str, expected_version: u64) -> Result<u64, ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/data/{key}")))
            .bearer_auth(&self.session_token)
            .header(EXPECTED_VERSION_HEADER, expected_version)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let body = Self::read_success(response).await?;
        let ack: MutationAck = decode(&body)?;
        tracing::debug!(message = %ack.message, version = ack.version, "Record deleted");
        Ok(ack.version)
    }
}

#[async_trait]
impl RecordApi for HttpRecordApi {
    async fn fetch_all(&self) -> Result<CollectionSnapshot, ApiError> {
        let result = self.do_fetch_all().await;
        track(MutationKind::Refresh, &result);
        result
    }

    async fn create(
        &self,
        record: &AccountRecord,
        expected_version: u64,
    ) -> Result<u64, ApiError> {
        let result = self.do_create(record, expected_version).await;
        track(MutationKind::Create, &result);
        result
    }

    async fn update(
        &self,
        key: &str,
        patch: &RecordPatch,
        expected_version: u64,
    ) -> Result<RecordUpdate, ApiError> {
        let result = self.do_update(key, patch, expected_version).await;
        track(MutationKind::Update, &result);
        result
    }

    async fn delete(&self, key: &str, expected_version: u64) -> Result<u64, ApiError> {
        let result = self.do_delete(key, expected_version).await;
        track(MutationKind::Delete, &result);
        result
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode {
        message: e.to_string(),
    })
}

/// Record the call outcome for the metrics surface.
fn track<T>(kind: MutationKind, result: &Result<T, ApiError>) {
    let outcome = match result {
        Ok(_) => MutationOutcome::Ok,
        Err(e) if e.is_conflict() => {
            metrics::record_conflict();
            MutationOutcome::Conflict
        }
        Err(_) => MutationOutcome::Failed,
    };
    metrics::record_mutation(kind, outcome);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_ten_second_timeout() {
        let config = RecordApiConfig::new("http://localhost:8000", "tok");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let config = RecordApiConfig::new("http://localhost:8000/", "tok");
        let api = HttpRecordApi::new(&config).unwrap();
        assert_eq!(api.url("/data"), "http://localhost:8000/data");
    }

    #[test]
    fn keyed_paths_embed_the_key() {
        let config = RecordApiConfig::new("http://localhost:8000", "tok");
        let api = HttpRecordApi::new(&config).unwrap();
        assert_eq!(api.url("/data/ak-1"), "http://localhost:8000/data/ak-1");
    }

    #[test]
    fn decode_failure_classifies_as_decode() {
        let err = decode::<MutationAck>("not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
