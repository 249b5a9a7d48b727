//! Error types for the harvesting pipeline.

use nyt_indexer_repository::StoreError;
use thiserror::Error;

/// Errors that can occur in the harvesting pipeline.
///
/// Only `QuotaExhausted`, `Config` and `Cursor` end a run; the others are
/// scoped to one request, page or record and are recovered locally.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// A request could not be built from the given parameters.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The daily call quota is used up.
    #[error("Quota exhausted: {calls_made} of {max_calls_per_day} daily calls used")]
    QuotaExhausted {
        calls_made: u32,
        max_calls_per_day: u32,
    },

    /// Network or HTTP failure talking to the external API.
    #[error("Transient fetch error: {0}")]
    TransientFetch(String),

    /// A single record could not be turned into a document.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// The bulk write call itself failed.
    #[error("Write error: {0}")]
    Write(String),

    /// Cursor persistence failed.
    #[error("Cursor store error: {0}")]
    Cursor(String),

    /// Invalid pipeline configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a transient fetch error.
    pub fn transient_fetch(msg: impl Into<String>) -> Self {
        Self::TransientFetch(msg.into())
    }

    /// Create a mapping error.
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a cursor store error.
    pub fn cursor(msg: impl Into<String>) -> Self {
        Self::Cursor(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error ends the whole run rather than one page.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::QuotaExhausted { .. } | Self::Config(_) | Self::Cursor(_)
        )
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        Self::Write(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        Self::TransientFetch(err.to_string())
    }
}
