//! Loader module for the harvesting pipeline.
//!
//! Writes mapped batches into the datastore, one bulk call per batch.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::errors::PipelineError;
use nyt_indexer_repository::DocumentStore;
use nyt_indexer_shared::Batch;

/// Configuration for the bulk writer.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Maximum number of documents allowed in a single bulk call.
    /// Set to None to disable the limit.
    pub max_batch_size: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
        }
    }
}

/// Outcome of writing one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    /// `true` only if every document of the batch was written.
    pub succeeded: bool,
    /// Documents the datastore rejected.
    pub failed_count: usize,
    /// Documents the datastore accepted. They stay written even when
    /// `succeeded` is `false`.
    pub written_count: usize,
}

/// Writes batches to the datastore.
///
/// A batch with any rejected document is reported as not succeeded; a
/// failing bulk call is returned as `PipelineError::Write`. Callers treat
/// both the same way and leave their cursor where it was.
pub struct BulkWriter {
    store: Arc<dyn DocumentStore>,
    config: LoaderConfig,
}

impl BulkWriter {
    /// Create a new bulk writer with the default configuration.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            config: LoaderConfig::default(),
        }
    }

    /// Create a new bulk writer with custom configuration.
    pub fn with_config(store: Arc<dyn DocumentStore>, config: LoaderConfig) -> Self {
        Self { store, config }
    }

    /// Write one batch with a single bulk call.
    ///
    /// An empty batch is a successful no-op.
    #[instrument(skip(self, batch), fields(collection = %batch.collection, document_count = batch.len()))]
    pub async fn write(&self, batch: &Batch) -> Result<WriteResult, PipelineError> {
        if batch.is_empty() {
            debug!("Empty batch, nothing to write");
            return Ok(WriteResult {
                succeeded: true,
                failed_count: 0,
                written_count: 0,
            });
        }

        if let Some(max) = self.config.max_batch_size {
            if batch.len() > max {
                return Err(PipelineError::write(format!(
                    "batch size {} exceeds maximum {}",
                    batch.len(),
                    max
                )));
            }
        }

        let summary = self.store.bulk_write(&batch.documents).await?;

        if summary.has_failures() {
            for failure in &summary.failures {
                warn!(
                    id = ?failure.id,
                    status = failure.status,
                    reason = %failure.reason,
                    "Document rejected by datastore"
                );
            }
            warn!(
                written = summary.succeeded,
                failed = summary.failed,
                "Failed to save some documents"
            );
        } else {
            info!(written = summary.succeeded, "Documents saved");
        }

        Ok(WriteResult {
            succeeded: !summary.has_failures(),
            failed_count: summary.failed,
            written_count: summary.succeeded,
        })
    }
}
