//! Error taxonomy for the indexing and query pipeline.
//!
//! Low-level transport errors (reqwest, sqlx, serde) are caught at each
//! component boundary and re-raised as one of these variants so callers
//! never see raw client errors. A missing record during a single-record
//! reindex is deliberately *not* an error: the record may have been
//! deleted between notification and processing, so the writer logs and
//! returns `Ok`.

use thiserror::Error;

use crate::engine::ImportFailure;

/// Result type alias for the indexing and query pipeline.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors produced by the indexing and query pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SearchError {
    /// Required connection parameters are missing or invalid. Fatal at
    /// startup; the subsystem never initializes without them.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Collection creation was rejected by the engine. Fatal for that
    /// content type's rebuild, isolated from sibling types.
    #[error("failed to create collection '{collection}': {message}")]
    Schema { collection: String, message: String },

    /// A bulk or single upsert failed at the engine, with any available
    /// per-document detail.
    #[error("index write to '{collection}' failed: {failed} of {total} documents rejected")]
    Write {
        collection: String,
        failed: usize,
        total: usize,
        failures: Vec<ImportFailure>,
    },

    /// Malformed, missing, or oversized search query. Returned to the
    /// caller as a 400-class response and never retried.
    #[error("invalid search query: {0}")]
    InvalidQuery(String),

    /// Transport or protocol failure talking to the search engine.
    #[error("search engine error: {0}")]
    Engine(String),

    /// Failure reading from the source of truth (relational store or
    /// bundled content document).
    #[error("source store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Engine(err.to_string())
    }
}

impl From<sqlx::Error> for SearchError {
    fn from(err: sqlx::Error) -> Self {
        SearchError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Engine(format!("serialization failed: {err}"))
    }
}
