//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `DocumentStore`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts},
    BulkParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::DocumentStore;
use crate::types::{BulkItemFailure, BulkWriteSummary, IndexDefinition};
use nyt_indexer_shared::Document;

/// OpenSearch-backed document store.
///
/// # Example
///
/// ```ignore
/// let store = OpenSearchClient::new("http://localhost:9200").await?;
/// let summary = store.bulk_write(&batch.documents).await?;
/// println!("{} of {} written", summary.succeeded, summary.total);
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(StoreError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let parsed_url = Url::parse(url).map_err(|e| StoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }

    /// Build the newline-delimited bulk body: one action line followed by
    /// the document source, per document.
    fn bulk_body(documents: &[Document]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);

        for doc in documents {
            let action = match &doc.id {
                Some(id) => json!({"index": {"_index": doc.collection, "_id": id}}),
                None => json!({"index": {"_index": doc.collection}}),
            };
            body.push(action.into());
            body.push(Value::Object(doc.body.clone()).into());
        }

        body
    }

    /// Interpret a bulk response body.
    ///
    /// Every item carrying an `error` object, or a status of 300 or more,
    /// counts as a failed document. `"errors": true` without any itemized
    /// failure fails the whole batch.
    pub(crate) fn parse_bulk_response(response: &Value, total: usize) -> BulkWriteSummary {
        let empty = Vec::new();
        let items = response
            .get("items")
            .and_then(|i| i.as_array())
            .unwrap_or(&empty);

        let failures: Vec<BulkItemFailure> = items
            .iter()
            .filter_map(|item| item.as_object()?.values().next())
            .filter_map(|result| {
                let status = result.get("status").and_then(|s| s.as_u64()).unwrap_or(0) as u16;
                let error = result.get("error");
                if error.is_none() && status < 300 {
                    return None;
                }
                let reason = error
                    .and_then(|e| e.get("reason").or(Some(e)))
                    .map(|r| match r.as_str() {
                        Some(s) => s.to_string(),
                        None => r.to_string(),
                    })
                    .unwrap_or_else(|| format!("status {}", status));
                Some(BulkItemFailure {
                    id: result.get("_id").and_then(|i| i.as_str()).map(String::from),
                    status,
                    reason,
                })
            })
            .collect();

        let flagged = response.get("errors").and_then(Value::as_bool).unwrap_or(false);
        if flagged && failures.is_empty() && total > 0 {
            return BulkWriteSummary {
                total,
                succeeded: 0,
                failed: total,
                failures: vec![BulkItemFailure {
                    id: None,
                    status: 0,
                    reason: "bulk response reported errors without item details".to_string(),
                }],
            };
        }

        let failed = failures.len().min(total);
        BulkWriteSummary {
            total,
            succeeded: total - failed,
            failed,
            failures,
        }
    }
}

#[async_trait]
impl DocumentStore for OpenSearchClient {
    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    async fn bulk_write(&self, documents: &[Document]) -> Result<BulkWriteSummary, StoreError> {
        if documents.is_empty() {
            return Ok(BulkWriteSummary::default());
        }

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(Self::bulk_body(documents))
            .send()
            .await
            .map_err(|e| StoreError::bulk_write(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(StoreError::bulk_write(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;

        let summary = Self::parse_bulk_response(&body, documents.len());
        if summary.has_failures() {
            warn!(
                failed = summary.failed,
                total = summary.total,
                "Bulk request completed with document failures"
            );
        } else {
            debug!(total = summary.total, "Bulk request completed");
        }

        Ok(summary)
    }

    async fn create_index(
        &self,
        name: &str,
        definition: &IndexDefinition,
    ) -> Result<bool, StoreError> {
        info!(index = %name, "Creating index");

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(definition.to_body())
            .send()
            .await
            .map_err(|e| StoreError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(index = %name, status = %status, body = %error_body, "Index creation failed");
            return Err(StoreError::index_creation(format!(
                "Index creation failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;
        let acknowledged = body
            .get("acknowledged")
            .and_then(|a| a.as_bool())
            .unwrap_or(false);

        if acknowledged {
            info!(index = %name, "Index created");
        } else {
            warn!(index = %name, "Index creation was not acknowledged");
        }

        Ok(acknowledged)
    }

    async fn delete_index(&self, name: &str) -> Result<(), StoreError> {
        info!(index = %name, "Deleting index");

        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| StoreError::index_deletion(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - index may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(index = %name, status = %status, body = %error_body, "Index deletion failed");
            return Err(StoreError::index_deletion(format!(
                "Index deletion failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %name, "Index deleted");
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> Result<bool, StoreError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }

    async fn search(&self, collection: &str, body: &Value) -> Result<Value, StoreError> {
        let response = self
            .client
            .search(SearchParts::Index(&[collection]))
            .body(body.clone())
            .send()
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(collection = %collection, status = %status, body = %error_body, "Search request failed");
            return Err(StoreError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let health: Value = response
            .json()
            .await
            .map_err(|e| StoreError::parse(e.to_string()))?;
        let status = health
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");

        debug!(status = %status, "Cluster health");
        Ok(status == "green" || status == "yellow")
    }
}
