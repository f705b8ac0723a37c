//! File-backed id counter persistence.
//!
//! One small JSON document, rewritten synchronously after every allocation.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write leaves the previous document intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chime_core::scheduling::ports::CounterStore;
use chime_domain::{ChimeError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scheduling::error::SchedulerError;

#[derive(Debug, Serialize, Deserialize)]
struct CounterDocument {
    version: u32,
    next_id: i64,
}

/// [`CounterStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    /// Store writing to `path`. The parent directory is created on the
    /// first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> std::result::Result<Option<CounterDocument>, SchedulerError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn write_document(&self, doc: &CounterDocument) -> std::result::Result<(), SchedulerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec(doc)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CounterStore for FileCounterStore {
    fn load(&self) -> Result<Option<i64>> {
        let document = self.read_document().map_err(ChimeError::from)?;
        Ok(document.map(|doc| doc.next_id))
    }

    fn save(&self, next: i64) -> Result<()> {
        self.write_document(&CounterDocument { version: 1, next_id: next })
            .map_err(ChimeError::from)?;
        debug!(next, path = %self.path.display(), "persisted id counter");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCounterStore::new(dir.path().join("counter.json"));
        assert_eq!(store.load().expect("load"), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCounterStore::new(dir.path().join("counter.json"));

        store.save(777_123).expect("save");
        assert_eq!(store.load().expect("load"), Some(777_123));

        store.save(777_124).expect("save");
        assert_eq!(store.load().expect("load"), Some(777_124));
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCounterStore::new(dir.path().join("nested/state/counter.json"));

        store.save(777_001).expect("save");
        assert_eq!(store.load().expect("load"), Some(777_001));
    }

    #[test]
    fn corrupt_document_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("counter.json");
        fs::write(&path, b"not json").expect("write");

        let store = FileCounterStore::new(path);
        let err = store.load().expect_err("corrupt file must fail");
        assert!(matches!(err, ChimeError::Storage(_)));
    }
}
