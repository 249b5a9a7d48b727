//! OpenSearch implementation of the document store.
//!
//! This module provides a concrete implementation of `DocumentStore`
//! using OpenSearch as the backend, plus the index mappings and the
//! aggregation queries run against it.

mod client;
mod index_config;
pub mod queries;

pub use client::OpenSearchClient;
pub use index_config::index_definition;
