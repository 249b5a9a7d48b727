//! Document mapper implementation.
//!
//! Transforms raw API records into documents tagged with their target
//! collection.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::PipelineError;
use nyt_indexer_shared::{Batch, Document, RawRecord, SourceKind};

/// Documents mapped from one page, plus the count of rejected records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappedBatch {
    pub batch: Batch,
    /// Records that were not null but could not be mapped.
    pub rejected: usize,
}

/// Maps raw records to documents.
///
/// The mapper is responsible for:
/// - Dropping null records
/// - Rejecting (and counting) records that are not JSON objects
/// - Deriving a stable document id from the source's identifying fields
///
/// It never deduplicates; repeated ids are upserts at the datastore.
#[derive(Debug, Clone, Default)]
pub struct DocumentMapper {
    id_fields: Vec<String>,
}

impl DocumentMapper {
    /// Mapper using the identifying fields of `kind`.
    pub fn for_kind(kind: SourceKind) -> Self {
        Self::with_id_fields(kind.id_fields().iter().copied())
    }

    /// Mapper using custom identifying fields. No fields means every
    /// document gets a datastore-assigned id.
    pub fn with_id_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Map every record of one page.
    ///
    /// # Returns
    ///
    /// A batch with one document per non-null, well-formed record, in input
    /// order, and the number of rejected records.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub fn map(&self, collection: &str, records: Vec<RawRecord>) -> MappedBatch {
        let mut documents = Vec::with_capacity(records.len());
        let mut rejected = 0;

        for (position, record) in records.into_iter().enumerate() {
            match self.map_record(collection, record) {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {}
                Err(e) => {
                    warn!(position = position, error = %e, "Skipping unmappable record");
                    rejected += 1;
                }
            }
        }

        debug!(
            documents = documents.len(),
            rejected = rejected,
            "Mapped records"
        );

        MappedBatch {
            batch: Batch::new(collection, documents),
            rejected,
        }
    }

    /// Map a single record.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Document))` - The record is an object
    /// * `Ok(None)` - The record is null and is dropped
    /// * `Err(PipelineError::Mapping)` - The record is not an object
    pub fn map_record(
        &self,
        collection: &str,
        record: RawRecord,
    ) -> Result<Option<Document>, PipelineError> {
        match record {
            Value::Null => Ok(None),
            Value::Object(body) => {
                let id = self.document_id(&body);
                Ok(Some(Document::new(collection, id, body)))
            }
            other => Err(PipelineError::mapping(format!(
                "expected an object, found {}",
                json_type(&other)
            ))),
        }
    }

    /// Join the identifying field values with `_`.
    ///
    /// Any missing or empty identifying field means no stable id.
    fn document_id(&self, body: &serde_json::Map<String, Value>) -> Option<String> {
        if self.id_fields.is_empty() {
            return None;
        }

        let mut parts = Vec::with_capacity(self.id_fields.len());
        for field in &self.id_fields {
            let part = match body.get(field)? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            if part.is_empty() {
                return None;
            }
            parts.push(part);
        }

        Some(parts.join("_"))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
