//! # NYT Indexer API
//!
//! Read-only HTTP API serving pre-built aggregations over the `news`
//! collection.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use chrono::{Local, NaiveDate};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use nyt_indexer_repository::AnalyticsClient;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub analytics: Arc<AnalyticsClient>,
    /// Reference date of the relative time scales.
    pub today: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(analytics: AnalyticsClient) -> Self {
        Self {
            analytics: Arc::new(analytics),
            today: local_today,
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/news/top-journalists", get(handlers::top_journalists))
        .route("/news/top-persons", get(handlers::top_persons))
        .route("/news/articles-count", get(handlers::articles_count))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{self, Body};
    use http::{Request, StatusCode};
    use nyt_indexer_repository::{BulkWriteSummary, DocumentStore, IndexDefinition, StoreError};
    use nyt_indexer_shared::Document;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BODY_LIMIT: usize = 1024 * 1024;

    /// Store answering every search with the same response.
    struct MockStore {
        response: Result<Value, StoreError>,
        searches: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn bulk_write(&self, documents: &[Document]) -> Result<BulkWriteSummary, StoreError> {
            Ok(BulkWriteSummary::all_succeeded(documents.len()))
        }

        async fn create_index(&self, _name: &str, _definition: &IndexDefinition) -> Result<bool, StoreError> {
            Ok(true)
        }

        async fn delete_index(&self, _name: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn index_exists(&self, _name: &str) -> Result<bool, StoreError> {
            Ok(true)
        }

        async fn search(&self, collection: &str, body: &Value) -> Result<Value, StoreError> {
            self.searches
                .lock()
                .await
                .push((collection.to_string(), body.clone()));
            self.response.clone()
        }

        async fn health_check(&self) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn app(response: Result<Value, StoreError>) -> (Router, Arc<MockStore>) {
        let store = Arc::new(MockStore {
            response,
            searches: Mutex::new(Vec::new()),
        });
        let state = AppState {
            analytics: Arc::new(AnalyticsClient::new(store.clone())),
            today: fixed_today,
        };
        (create_router(state), store)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn buckets(name: &str) -> Value {
        json!({
            "aggregations": {
                (name): {"buckets": [{"key": "By Jane Doe", "doc_count": 12}]}
            }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(Ok(json!({})));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body::to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_top_journalists_returns_encoded_buckets() {
        let (app, store) = app(Ok(buckets("articles_per_author")));

        let (status, body) = get(app, "/news/top-journalists?section=world&time_scale=week_ago").await;

        assert_eq!(status, StatusCode::OK);
        let data: Value = serde_json::from_str(body["data"].as_str().unwrap()).unwrap();
        assert_eq!(data, json!([{"key": "By Jane Doe", "doc_count": 12}]));

        let searches = store.searches.lock().await;
        assert_eq!(searches[0].0, "news");
        let query = searches[0].1.to_string();
        assert!(query.contains("2024-03-03"));
        assert!(query.contains("byline.keyword"));
    }

    #[tokio::test]
    async fn test_unknown_time_scale_has_no_date_filter() {
        let (app, store) = app(Ok(buckets("persons")));

        let (status, _) = get(app, "/news/top-persons?section=arts&time_scale=decade").await;

        assert_eq!(status, StatusCode::OK);
        let query = store.searches.lock().await[0].1.to_string();
        assert!(!query.contains("first_published_date"));
        assert!(query.contains("per_facet"));
    }

    #[tokio::test]
    async fn test_articles_count() {
        let (app, store) = app(Ok(buckets("articles_over_time")));

        let (status, body) = get(app, "/news/articles-count?section=world&step=month").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].is_string());
        let query = store.searches.lock().await[0].1.to_string();
        assert!(query.contains("\"calendar_interval\":\"month\""));
    }

    #[tokio::test]
    async fn test_missing_section_is_bad_request() {
        let (app, store) = app(Ok(buckets("articles_per_author")));

        let (status, body) = get(app, "/news/top-journalists?time_scale=yesterday").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("section"));
        assert!(store.searches.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_step_is_bad_request() {
        let (app, _) = app(Ok(buckets("articles_over_time")));

        let (status, _) = get(app.clone(), "/news/articles-count?section=world&step=week").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(app, "/news/articles-count?section=world").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_datastore_failure_is_server_error_without_data() {
        let (app, _) = app(Err(StoreError::query("index_not_found_exception")));

        let (status, body) = get(app, "/news/top-persons?section=world&time_scale=yesterday").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("data").is_none());
        assert!(body["error"].as_str().unwrap().contains("index_not_found_exception"));
    }
}
