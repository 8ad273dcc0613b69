//! Record API Adapter
//!
//! HTTP client for the data service's record endpoints:
//!
//! - **Types**: wire DTOs matching the REST format
//! - **Error**: classification of failures into [`crate::application::ports::ApiError`]
//! - **Client**: the [`crate::application::ports::RecordApi`] port over reqwest

pub mod client;
pub mod error;
pub mod types;

pub use client::{EXPECTED_VERSION_HEADER, HttpRecordApi, RecordApiConfig};
pub use error::{classify_status, classify_transport};
pub use types::{CollectionResponse, ErrorBody, MutationAck, UpdateResponse};
