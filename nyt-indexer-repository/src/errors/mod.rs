//! Error types for the NYT indexer repository.

mod store_error;

pub use store_error::StoreError;
