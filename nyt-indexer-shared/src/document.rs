//! Documents and batches written to the datastore.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One item exactly as the external API returned it. May be `null`.
pub type RawRecord = Value;

/// A normalized document tagged with its target collection.
///
/// The body is always a JSON object; null records never become documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Target collection (index) name.
    pub collection: String,
    /// Stable identifier. `None` lets the datastore assign one.
    pub id: Option<String>,
    /// The record fields.
    pub body: Map<String, Value>,
}

impl Document {
    pub fn new(collection: impl Into<String>, id: Option<String>, body: Map<String, Value>) -> Self {
        Self {
            collection: collection.into(),
            id,
            body,
        }
    }
}

/// Documents produced from exactly one API response, all in one collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    pub collection: String,
    pub documents: Vec<Document>,
}

impl Batch {
    pub fn new(collection: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            collection: collection.into(),
            documents,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
