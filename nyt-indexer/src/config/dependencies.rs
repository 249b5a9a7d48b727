//! Dependency initialization and wiring for the NYT indexer.

use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::IndexingError;
use nyt_indexer_pipeline::{
    consumer::{HttpSourceClient, QueryBuilder},
    cursor::FileCursorStore,
    loader::BulkWriter,
    orchestrator::{Harvester, HarvesterConfig},
    quota::{RateLimiter, TokioClock},
};
use nyt_indexer_repository::{DocumentStore, OpenSearchClient};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Datastore client shared by the writer and the index commands.
    pub store: Arc<dyn DocumentStore>,
    /// The configured harvester, present when an API key is set.
    pub harvester: Option<Harvester>,
}

impl Dependencies {
    /// Connect to OpenSearch and verify the cluster is healthy.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<dyn DocumentStore>)` - A connected store
    /// * `Err(IndexingError)` - If the client cannot be built or the cluster is unhealthy
    pub async fn connect_store(settings: &Settings) -> Result<Arc<dyn DocumentStore>, IndexingError> {
        let search_client = OpenSearchClient::new(&settings.opensearch_url)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!(opensearch_url = %settings.opensearch_url, "OpenSearch connection verified");
        Ok(Arc::new(search_client))
    }

    /// Initialize all dependencies of a harvest run.
    ///
    /// `start_offset` overrides the saved cursors of offset-paginated sources.
    pub async fn new(settings: &Settings, start_offset: Option<u64>) -> Result<Self, IndexingError> {
        info!(
            api_base_url = %settings.api_base_url,
            opensearch_url = %settings.opensearch_url,
            cursor_file = %settings.cursor_file.display(),
            max_calls_per_minute = settings.quota.max_calls_per_minute,
            max_calls_per_day = settings.quota.max_calls_per_day,
            "Initializing dependencies"
        );

        let store = Self::connect_store(settings).await?;

        let harvester = match settings.api_key.as_deref() {
            Some(api_key) => Some(Self::build_harvester(settings, api_key, store.clone(), start_offset)?),
            None => None,
        };

        Ok(Self { store, harvester })
    }

    fn build_harvester(
        settings: &Settings,
        api_key: &str,
        store: Arc<dyn DocumentStore>,
        start_offset: Option<u64>,
    ) -> Result<Harvester, IndexingError> {
        let query_builder = QueryBuilder::new(&settings.api_base_url, api_key)?;
        let source = HttpSourceClient::new(settings.http_timeout)?;
        let limiter = RateLimiter::new(Arc::new(TokioClock));
        let writer = BulkWriter::new(store);
        let cursors = FileCursorStore::new(settings.cursor_file.clone());

        info!("Harvester created");

        Ok(Harvester::with_config(
            query_builder,
            Arc::new(source),
            limiter,
            writer,
            Arc::new(cursors),
            HarvesterConfig {
                start_offset,
                ..HarvesterConfig::default()
            },
        ))
    }
}
