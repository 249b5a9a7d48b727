//! Processor module for the harvesting pipeline.
//!
//! Transforms raw API records into datastore documents.

mod document_mapper;

pub use document_mapper::{DocumentMapper, MappedBatch};
