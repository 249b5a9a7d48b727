//! Operator commands: harvesting and index provisioning.

use std::future::Future;

use tracing::{info, instrument, warn};

use crate::IndexingError;
use nyt_indexer_pipeline::orchestrator::{HarvestReport, Harvester, RunState};
use nyt_indexer_pipeline::quota::QuotaLimits;
use nyt_indexer_repository::{index_definition, DocumentStore};
use nyt_indexer_shared::{SourceDescriptor, SourceKind};

/// Result of provisioning one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyExists,
    NotAcknowledged,
}

/// What a harvest run did.
#[derive(Debug)]
pub struct HarvestSummary {
    /// One report per finished source. Empty when the run was interrupted.
    pub reports: Vec<HarvestReport>,
    pub state: RunState,
    /// Whether `shutdown` fired before the run finished.
    pub interrupted: bool,
}

/// Run every source once, or until `shutdown` resolves.
///
/// Cursors are saved after every write, so an interrupted run loses at most
/// the iteration in flight.
pub async fn harvest<F>(
    harvester: &Harvester,
    kinds: &[SourceKind],
    limits: QuotaLimits,
    shutdown: F,
) -> Result<HarvestSummary, IndexingError>
where
    F: Future<Output = ()>,
{
    let descriptors: Vec<SourceDescriptor> =
        kinds.iter().copied().map(SourceDescriptor::for_kind).collect();
    let mut state = RunState::new(limits);

    let finished = tokio::select! {
        result = harvester.run(&descriptors, &mut state) => Some(result),
        _ = shutdown => None,
    };

    match finished {
        Some(result) => Ok(HarvestSummary {
            reports: result?,
            state,
            interrupted: false,
        }),
        None => {
            warn!(
                calls_this_run = state.quota.calls_this_run,
                "Harvest interrupted by shutdown signal"
            );
            Ok(HarvestSummary {
                reports: Vec::new(),
                state,
                interrupted: true,
            })
        }
    }
}

/// Create the index of each kind. Existing indices are left untouched.
#[instrument(skip(store))]
pub async fn create_indices(
    store: &dyn DocumentStore,
    kinds: &[SourceKind],
) -> Result<Vec<(String, IndexStatus)>, IndexingError> {
    let mut results = Vec::with_capacity(kinds.len());

    for kind in kinds {
        let name = kind.as_str();
        let status = if store.index_exists(name).await? {
            info!(index = %name, "Index already exists, skipping");
            IndexStatus::AlreadyExists
        } else if store.create_index(name, &index_definition(*kind)).await? {
            info!(index = %name, "Index created");
            IndexStatus::Created
        } else {
            warn!(index = %name, "Index creation not acknowledged");
            IndexStatus::NotAcknowledged
        };
        results.push((name.to_string(), status));
    }

    Ok(results)
}

/// Delete one index. A missing index is not an error.
#[instrument(skip(store))]
pub async fn delete_index(store: &dyn DocumentStore, name: &str) -> Result<(), IndexingError> {
    store.delete_index(name).await?;
    info!(index = %name, "Index deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nyt_indexer_pipeline::consumer::{QueryBuilder, RequestSpec, SourceClient};
    use nyt_indexer_pipeline::cursor::{CursorStore, MemoryCursorStore, OffsetCursor, PagingCursor};
    use nyt_indexer_pipeline::loader::BulkWriter;
    use nyt_indexer_pipeline::quota::{ManualClock, RateLimiter};
    use nyt_indexer_pipeline::PipelineError;
    use nyt_indexer_repository::{BulkWriteSummary, IndexDefinition, StoreError};
    use nyt_indexer_shared::{ApiPage, Document};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockStore {
        existing: Vec<String>,
        created: Mutex<Vec<(String, IndexDefinition)>>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn bulk_write(&self, documents: &[Document]) -> Result<BulkWriteSummary, StoreError> {
            Ok(BulkWriteSummary::all_succeeded(documents.len()))
        }

        async fn create_index(&self, name: &str, definition: &IndexDefinition) -> Result<bool, StoreError> {
            self.created
                .lock()
                .await
                .push((name.to_string(), definition.clone()));
            Ok(true)
        }

        async fn delete_index(&self, name: &str) -> Result<(), StoreError> {
            self.deleted.lock().await.push(name.to_string());
            Ok(())
        }

        async fn index_exists(&self, name: &str) -> Result<bool, StoreError> {
            Ok(self.existing.iter().any(|existing| existing == name))
        }

        async fn search(&self, _collection: &str, _body: &Value) -> Result<Value, StoreError> {
            Ok(Value::Null)
        }

        async fn health_check(&self) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_create_indices_skips_existing() {
        let store = MockStore {
            existing: vec!["books".to_string()],
            ..MockStore::default()
        };

        let results = create_indices(&store, &[SourceKind::News, SourceKind::Books])
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![
                ("news".to_string(), IndexStatus::Created),
                ("books".to_string(), IndexStatus::AlreadyExists),
            ]
        );

        let created = store.created.lock().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].1, index_definition(SourceKind::News));
    }

    #[tokio::test]
    async fn test_delete_index() {
        let store = MockStore::default();
        delete_index(&store, "movies").await.unwrap();
        assert_eq!(*store.deleted.lock().await, vec!["movies".to_string()]);
    }

    /// Serves one page of books, then hangs on every later request.
    struct OnePageThenHang {
        served: Mutex<bool>,
    }

    #[async_trait]
    impl SourceClient for OnePageThenHang {
        async fn fetch(&self, _request: &RequestSpec) -> Result<ApiPage, PipelineError> {
            let mut served = self.served.lock().await;
            if *served {
                drop(served);
                return std::future::pending().await;
            }
            *served = true;
            let books = (0..20)
                .map(|i| json!({"title": format!("BOOK {}", i), "author": "Someone"}))
                .collect();
            Ok(ApiPage::new(books, None))
        }
    }

    fn harvester(cursors: Arc<MemoryCursorStore>) -> Harvester {
        Harvester::new(
            QueryBuilder::new("https://api.example.com/svc", "key").unwrap(),
            Arc::new(OnePageThenHang {
                served: Mutex::new(false),
            }),
            RateLimiter::new(Arc::new(ManualClock::new())),
            BulkWriter::new(Arc::new(MockStore::default())),
            cursors,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_harvest_stops_on_shutdown_with_cursor_saved() {
        let cursors = Arc::new(MemoryCursorStore::new());
        let harvester = harvester(cursors.clone());

        let summary = harvest(
            &harvester,
            &[SourceKind::Books],
            QuotaLimits::default(),
            tokio::time::sleep(Duration::from_secs(1)),
        )
        .await
        .unwrap();

        assert!(summary.interrupted);
        assert!(summary.reports.is_empty());
        assert_eq!(summary.state.quota.calls_this_run, 1);
        assert_eq!(summary.state.stats.documents_written, 20);
        assert_eq!(
            cursors.load("books").await.unwrap(),
            Some(PagingCursor::Offset(OffsetCursor::new(20, 20)))
        );
    }

    #[tokio::test]
    async fn test_harvest_finishes_before_shutdown() {
        let cursors = Arc::new(MemoryCursorStore::new());
        let harvester = harvester(cursors);

        let summary = harvest(
            &harvester,
            &[SourceKind::Books],
            QuotaLimits {
                max_calls_per_minute: 5,
                max_calls_per_day: 1,
            },
            std::future::pending(),
        )
        .await
        .unwrap();

        assert!(!summary.interrupted);
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.state.quota.calls_this_run, 1);
    }
}
