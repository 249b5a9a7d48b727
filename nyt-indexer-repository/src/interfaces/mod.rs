//! Interface definitions for the datastore.
//!
//! This module defines the abstract `DocumentStore` trait that allows for
//! dependency injection and swappable datastore implementations.

mod document_store;

pub use document_store::DocumentStore;
