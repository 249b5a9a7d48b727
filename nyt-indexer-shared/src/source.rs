//! Source descriptors.
//!
//! A source descriptor ties one external API source to the collection its
//! documents land in and to the way its results are paged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The external API sources the harvester knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Newswire articles, one request per section.
    News,
    /// The list of newswire sections.
    NewsSections,
    /// Best-seller history, offset paginated.
    Books,
    /// Movie reviews, offset paginated.
    Movies,
}

impl SourceKind {
    /// All source kinds, in the order a full harvest visits them.
    pub const ALL: [SourceKind; 4] = [
        SourceKind::NewsSections,
        SourceKind::News,
        SourceKind::Books,
        SourceKind::Movies,
    ];

    /// Canonical lowercase name, also used as the default collection name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::News => "news",
            SourceKind::NewsSections => "news_sections",
            SourceKind::Books => "books",
            SourceKind::Movies => "movies",
        }
    }

    /// How results of this source are paged.
    pub fn paging_mode(&self) -> PagingMode {
        match self {
            SourceKind::News => PagingMode::SectionIteration,
            SourceKind::NewsSections => PagingMode::None,
            SourceKind::Books | SourceKind::Movies => PagingMode::Offset,
        }
    }

    /// Record fields whose values together identify an item of this source.
    pub fn id_fields(&self) -> &'static [&'static str] {
        match self {
            SourceKind::News => &["uri"],
            SourceKind::NewsSections => &["section"],
            SourceKind::Books => &["title", "author"],
            SourceKind::Movies => &["display_title", "publication_date"],
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown source kind: {0}")]
pub struct UnknownSourceKind(pub String);

impl FromStr for SourceKind {
    type Err = UnknownSourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "news" => Ok(SourceKind::News),
            "news_sections" | "sections" => Ok(SourceKind::NewsSections),
            "books" => Ok(SourceKind::Books),
            "movies" => Ok(SourceKind::Movies),
            _ => Err(UnknownSourceKind(s.to_string())),
        }
    }
}

/// Paging strategy of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingMode {
    /// A single request returns everything.
    None,
    /// One request per section of the section list.
    SectionIteration,
    /// Row-offset pagination.
    Offset,
}

/// Immutable description of one ingestion source, defined at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Which external source to read.
    pub kind: SourceKind,
    /// Datastore collection (index) receiving the documents.
    pub target_collection: String,
    /// How the source is paged.
    pub paging_mode: PagingMode,
}

impl SourceDescriptor {
    /// Descriptor with the canonical collection and paging mode for `kind`.
    pub fn for_kind(kind: SourceKind) -> Self {
        Self {
            kind,
            target_collection: kind.as_str().to_string(),
            paging_mode: kind.paging_mode(),
        }
    }

    pub fn news() -> Self {
        Self::for_kind(SourceKind::News)
    }

    pub fn news_sections() -> Self {
        Self::for_kind(SourceKind::NewsSections)
    }

    pub fn books() -> Self {
        Self::for_kind(SourceKind::Books)
    }

    pub fn movies() -> Self {
        Self::for_kind(SourceKind::Movies)
    }

    /// Same source, written to a different collection.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.target_collection = collection.into();
        self
    }
}
