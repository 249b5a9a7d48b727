//! Request and response types for datastore operations.

use serde_json::Value;

/// A document the datastore rejected inside an otherwise accepted bulk call.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemFailure {
    /// Document id, when one was sent or assigned.
    pub id: Option<String>,
    /// HTTP-like status the datastore reported for the item.
    pub status: u16,
    /// Error reason reported by the datastore.
    pub reason: String,
}

/// Outcome of one bulk write.
///
/// Bulk calls are not transactional: documents counted in `succeeded` stay
/// written even when `failed > 0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkWriteSummary {
    /// Number of documents submitted.
    pub total: usize,
    /// Number of documents the datastore accepted.
    pub succeeded: usize,
    /// Number of documents the datastore rejected.
    pub failed: usize,
    /// Details of each rejected document.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkWriteSummary {
    /// Summary of a bulk call where every document was accepted.
    pub fn all_succeeded(total: usize) -> Self {
        Self {
            total,
            succeeded: total,
            failed: 0,
            failures: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Settings and mappings used to provision an index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub settings: Value,
    pub mappings: Value,
}

impl IndexDefinition {
    pub fn new(settings: Value, mappings: Value) -> Self {
        Self { settings, mappings }
    }

    /// Request body of an index creation call.
    pub fn to_body(&self) -> Value {
        serde_json::json!({
            "settings": self.settings,
            "mappings": self.mappings,
        })
    }
}
