//! # NYT Indexer
//!
//! Main library for the NYT indexer.
//!
//! This crate provides the configuration, dependency wiring and operator
//! commands behind the `nyt-indexer` binary.

pub mod commands;
pub mod config;

pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] nyt_indexer_pipeline::PipelineError),

    /// Datastore error.
    #[error("Datastore error: {0}")]
    StoreError(#[from] nyt_indexer_repository::StoreError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
