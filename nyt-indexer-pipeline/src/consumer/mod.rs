//! Consumer module for the harvesting pipeline.
//!
//! Builds external API requests and fetches their pages.

mod query_builder;
mod source_client;

pub use query_builder::{QueryBuilder, QueryParams, RequestSpec, API_PAGE_SIZE, DEFAULT_BASE_URL};
pub use source_client::{HttpSourceClient, SourceClient};
