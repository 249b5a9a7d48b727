//! # NYT Indexer Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search/analytics datastore. It includes definitions for errors, the
//! `DocumentStore` interface, a concrete implementation for OpenSearch and
//! the read-side analytics client.

pub mod client;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use client::AnalyticsClient;
pub use errors::StoreError;
pub use interfaces::DocumentStore;
pub use opensearch::{index_definition, OpenSearchClient};
pub use types::{BulkItemFailure, BulkWriteSummary, IndexDefinition};
