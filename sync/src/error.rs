//! Error types for the todo API client and store.
//!
//! # Design
//! The variants follow how callers react rather than raw status codes:
//! `NotFound` and `Validation` are the two outcomes a UI handles explicitly,
//! `ServerError` and `Network` are reported and retried by the user. Any other
//! unexpected status lands in `HttpError`. Response bodies never appear in
//! `Display` output, so every message is safe to show a user; `HttpError`
//! keeps its body as a field for debugging.

use thiserror::Error;

use crate::types::TodoId;

/// Errors returned by `TodoClient`, `TodoApi` and `TodoStore` operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server returned 404: the requested todo does not exist.
    #[error("todo not found")]
    NotFound,

    /// The payload failed validation, either before the request was sent or
    /// with a 400 from the server.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The server returned a 5xx status.
    #[error("server error (HTTP {status})")]
    ServerError { status: u16 },

    /// The server returned a non-2xx status that is neither 400, 404 nor 5xx.
    #[error("unexpected HTTP {status}")]
    HttpError { status: u16, body: String },

    /// No response was received.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

/// Some deletes of a fan-out bulk delete failed.
///
/// The deletes that succeeded are not rolled back: `deleted` lists the ids
/// that are gone on the server and from the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to delete {} of {} todos: {source}", .failed.len(), .failed.len() + .deleted.len())]
pub struct BulkDeleteError {
    pub deleted: Vec<TodoId>,
    pub failed: Vec<TodoId>,
    #[source]
    pub source: ApiError,
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
