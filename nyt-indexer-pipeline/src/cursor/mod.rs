//! Paging cursors and their persistence.
//!
//! A cursor is the resumable position of one source. The harvester owns it
//! during a flow; a [`CursorStore`] keeps it between runs.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::errors::PipelineError;

/// Row offset into an offset-paginated source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetCursor {
    pub offset: u64,
    pub page_size: u64,
}

impl OffsetCursor {
    pub fn new(offset: u64, page_size: u64) -> Self {
        Self { offset, page_size }
    }

    /// Move past one fully written page.
    pub fn advance(&mut self) {
        self.offset += self.page_size;
    }
}

/// Index into the section list of a section-iterated source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCursor {
    pub index: usize,
}

impl SectionCursor {
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn advance(&mut self) {
        self.index += 1;
    }
}

/// Persisted form of either cursor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PagingCursor {
    Offset(OffsetCursor),
    Section(SectionCursor),
}

/// Storage for cursors, keyed by target collection.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the cursor of `collection`, if one was saved.
    async fn load(&self, collection: &str) -> Result<Option<PagingCursor>, PipelineError>;

    /// Save the cursor of `collection`, replacing any previous one.
    async fn save(&self, collection: &str, cursor: &PagingCursor) -> Result<(), PipelineError>;
}

/// Cursor store backed by a single JSON file.
///
/// The file holds one object mapping collection names to cursors. Writes go
/// to a sibling temp file that is then renamed over the target.
pub struct FileCursorStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, PagingCursor>, PipelineError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(PipelineError::cursor(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            PipelineError::cursor(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self, collection: &str) -> Result<Option<PagingCursor>, PipelineError> {
        let _guard = self.lock.lock().await;
        let cursor = self.read_all().await?.remove(collection);
        debug!(cursor = ?cursor, "Loaded cursor");
        Ok(cursor)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn save(&self, collection: &str, cursor: &PagingCursor) -> Result<(), PipelineError> {
        let _guard = self.lock.lock().await;

        let mut cursors = self.read_all().await?;
        cursors.insert(collection.to_string(), *cursor);

        let body = serde_json::to_vec_pretty(&cursors)
            .map_err(|e| PipelineError::cursor(format!("failed to serialize cursors: {}", e)))?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, &body).await.map_err(|e| {
            PipelineError::cursor(format!("failed to write {}: {}", temp.display(), e))
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            PipelineError::cursor(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!("Saved cursor");
        Ok(())
    }
}

/// In-process cursor store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryCursorStore {
    cursors: Mutex<HashMap<String, PagingCursor>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self, collection: &str) -> Result<Option<PagingCursor>, PipelineError> {
        Ok(self.cursors.lock().await.get(collection).copied())
    }

    async fn save(&self, collection: &str, cursor: &PagingCursor) -> Result<(), PipelineError> {
        self.cursors
            .lock()
            .await
            .insert(collection.to_string(), *cursor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advance() {
        let mut offset = OffsetCursor::new(40, 20);
        offset.advance();
        assert_eq!(offset.offset, 60);

        let mut section = SectionCursor::default();
        section.advance();
        assert_eq!(section.index, 1);
    }

    #[test]
    fn test_cursor_serialization_is_tagged() {
        let cursor = PagingCursor::Offset(OffsetCursor::new(20, 20));
        let json = serde_json::to_value(cursor).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"mode": "offset", "offset": 20, "page_size": 20})
        );

        let parsed: PagingCursor =
            serde_json::from_value(serde_json::json!({"mode": "section", "index": 3})).unwrap();
        assert_eq!(parsed, PagingCursor::Section(SectionCursor::new(3)));
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("cursors.json"));

        assert_eq!(store.load("books").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursors.json");

        let store = FileCursorStore::new(&path);
        store
            .save("books", &PagingCursor::Offset(OffsetCursor::new(60, 20)))
            .await
            .unwrap();
        store
            .save("news", &PagingCursor::Section(SectionCursor::new(4)))
            .await
            .unwrap();
        store
            .save("books", &PagingCursor::Offset(OffsetCursor::new(80, 20)))
            .await
            .unwrap();

        let reopened = FileCursorStore::new(&path);
        assert_eq!(
            reopened.load("books").await.unwrap(),
            Some(PagingCursor::Offset(OffsetCursor::new(80, 20)))
        );
        assert_eq!(
            reopened.load("news").await.unwrap(),
            Some(PagingCursor::Section(SectionCursor::new(4)))
        );
        assert!(!dir.path().join("cursors.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursors.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileCursorStore::new(&path);
        let result = store.load("books").await;

        assert!(matches!(result, Err(PipelineError::Cursor(_))));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCursorStore::new();
        assert_eq!(store.load("movies").await.unwrap(), None);

        let cursor = PagingCursor::Offset(OffsetCursor::new(0, 20));
        store.save("movies", &cursor).await.unwrap();

        assert_eq!(store.load("movies").await.unwrap(), Some(cursor));
    }
}
