//! Datastore error types.
//!
//! This module defines the errors that can occur while talking to the
//! document store.

use thiserror::Error;

/// Errors that can occur during datastore operations.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Failed to reach the datastore.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The bulk request itself failed.
    #[error("Bulk write error: {0}")]
    BulkWriteError(String),

    /// Failed to create an index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to delete an index.
    #[error("Index deletion error: {0}")]
    IndexDeletionError(String),

    /// Search or aggregation request failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Response could not be interpreted.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the datastore.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a bulk write error.
    pub fn bulk_write(msg: impl Into<String>) -> Self {
        Self::BulkWriteError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create an index deletion error.
    pub fn index_deletion(msg: impl Into<String>) -> Self {
        Self::IndexDeletionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}
