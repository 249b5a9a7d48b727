//! # NYT Indexer Shared
//!
//! Types shared by the harvesting pipeline, the datastore repository and the
//! query API: source descriptors, documents, API pages and the analytics
//! filter parameters, plus the tracing setup of both binaries.

pub mod analytics;
pub mod document;
pub mod page;
pub mod source;
pub mod telemetry;

pub use analytics::{CalendarStep, DateRange, InvalidCalendarStep, TimeScale};
pub use document::{Batch, Document, RawRecord};
pub use page::ApiPage;
pub use source::{PagingMode, SourceDescriptor, SourceKind, UnknownSourceKind};
pub use telemetry::{init_tracing, LogFormat};
