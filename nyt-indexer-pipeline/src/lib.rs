//! # NYT Indexer Pipeline
//!
//! This crate provides the pipeline components for harvesting the NYT
//! developer APIs and indexing the results into OpenSearch.
//!
//! ## Architecture
//!
//! The pipeline follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Builds requests and fetches pages from the external API
//! 2. **Processor**: Maps raw records into documents
//! 3. **Loader**: Bulk-writes documents into the datastore
//! 4. **Orchestrator**: Drives the flows, gated by the rate limiter
//!
//! Cursors persist the position of each source between runs.

pub mod consumer;
pub mod cursor;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod quota;

pub use errors::PipelineError;
pub use orchestrator::{FlowOutcome, HarvestReport, Harvester, HarvesterConfig, RunState, RunStats};
