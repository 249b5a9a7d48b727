//! Response envelope of the external API.

use serde::{Deserialize, Deserializer, Serialize};

use crate::document::RawRecord;

/// One decoded API response.
///
/// A missing or `null` `results` field decodes as an empty list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<RawRecord>,
    /// Total hits reported by the API, when it reports one.
    #[serde(default)]
    pub num_results: Option<u64>,
}

impl ApiPage {
    pub fn new(results: Vec<RawRecord>, num_results: Option<u64>) -> Self {
        Self {
            results,
            num_results,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RawRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RawRecord>>::deserialize(deserializer)?.unwrap_or_default())
}
