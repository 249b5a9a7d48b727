//! Analytics client implementation.
//!
//! This module provides the read-side client the query API uses to run the
//! pre-built news aggregations against an already populated index.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::StoreError;
use crate::interfaces::DocumentStore;
use crate::opensearch::queries::{
    build_articles_count_query, build_top_journalists_query, build_top_persons_query,
    ARTICLES_OVER_TIME, ARTICLES_PER_AUTHOR, PERSONS,
};
use nyt_indexer_shared::{CalendarStep, SourceKind, TimeScale};

/// Runs the news aggregations and returns their buckets.
pub struct AnalyticsClient {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl AnalyticsClient {
    /// Create a client reading the canonical `news` collection.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_collection(store, SourceKind::News.as_str())
    }

    /// Create a client reading a custom news collection.
    pub fn with_collection(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Top 10 journalists of a section, by article count.
    /// Input: section, optional time scale (None disables the date filter), today
    /// Output: Result<Vec<bucket>, StoreError>
    #[instrument(skip(self))]
    pub async fn top_journalists(
        &self,
        section: &str,
        time_scale: Option<TimeScale>,
        today: NaiveDate,
    ) -> Result<Vec<Value>, StoreError> {
        let range = time_scale.map(|scale| scale.date_range(today));
        let body = build_top_journalists_query(section, range);
        self.run_aggregation(&body, ARTICLES_PER_AUTHOR).await
    }

    /// Top 5 persons mentioned in a section.
    /// Input: section, optional time scale (None disables the date filter), today
    /// Output: Result<Vec<bucket>, StoreError>
    #[instrument(skip(self))]
    pub async fn top_persons(
        &self,
        section: &str,
        time_scale: Option<TimeScale>,
        today: NaiveDate,
    ) -> Result<Vec<Value>, StoreError> {
        let range = time_scale.map(|scale| scale.date_range(today));
        let body = build_top_persons_query(section, range);
        self.run_aggregation(&body, PERSONS).await
    }

    /// Article counts of a section per calendar step.
    #[instrument(skip(self))]
    pub async fn articles_count(
        &self,
        section: &str,
        step: CalendarStep,
    ) -> Result<Vec<Value>, StoreError> {
        let body = build_articles_count_query(section, step);
        self.run_aggregation(&body, ARTICLES_OVER_TIME).await
    }

    async fn run_aggregation(&self, body: &Value, aggregation: &str) -> Result<Vec<Value>, StoreError> {
        let response = self.store.search(&self.collection, body).await?;
        let buckets = Self::extract_buckets(&response, aggregation)?;
        debug!(aggregation = %aggregation, buckets = buckets.len(), "Aggregation completed");
        Ok(buckets)
    }

    /// Pull `aggregations.<name>.buckets` out of a search response.
    fn extract_buckets(response: &Value, aggregation: &str) -> Result<Vec<Value>, StoreError> {
        response
            .get("aggregations")
            .and_then(|aggs| aggs.get(aggregation))
            .and_then(|agg| agg.get("buckets"))
            .and_then(|buckets| buckets.as_array())
            .cloned()
            .ok_or_else(|| {
                StoreError::parse(format!("response has no buckets for aggregation {}", aggregation))
            })
    }
}
