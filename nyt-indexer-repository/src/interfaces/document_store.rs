//! Document store trait definition.
//!
//! This module defines the abstract interface for datastore operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch,
//! in-memory fakes).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;
use crate::types::{BulkWriteSummary, IndexDefinition};
use nyt_indexer_shared::Document;

/// Abstracts the underlying search/analytics datastore.
///
/// Implementations are injected into the bulk writer and the analytics
/// client, which keeps both testable with in-memory fakes.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write documents in a single bulk call.
    ///
    /// Each document goes to its own `collection`. Documents with an `id`
    /// replace any existing document with that id (upsert); documents
    /// without one get an id assigned by the datastore.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkWriteSummary)` - The call was accepted; per-document failures
    ///   are reported in the summary
    /// * `Err(StoreError)` - The bulk call itself failed
    async fn bulk_write(&self, documents: &[Document]) -> Result<BulkWriteSummary, StoreError>;

    /// Create an index with the given settings and mappings.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The datastore acknowledged the creation
    /// * `Ok(false)` - The request completed without acknowledgement
    /// * `Err(StoreError)` - The request failed
    async fn create_index(&self, name: &str, definition: &IndexDefinition)
        -> Result<bool, StoreError>;

    /// Delete an index. Deleting a missing index is not an error.
    async fn delete_index(&self, name: &str) -> Result<(), StoreError>;

    /// Check whether an index exists.
    async fn index_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Run a search request body against a collection and return the raw
    /// response.
    async fn search(&self, collection: &str, body: &Value) -> Result<Value, StoreError>;

    /// Check if the datastore is healthy and reachable.
    async fn health_check(&self) -> Result<bool, StoreError>;
}
