//! JSON file storage implementation
//!
//! Each aggregate lives in its own pretty-printed JSON file. Writes go to a sibling
//! temporary file first and are renamed into place, so a crash mid-write never leaves a
//! truncated frontier behind.

use crate::config::OutputConfig;
use crate::state::{BlockList, BookFrontier, OpenFrontier};
use crate::storage::traits::{AggregateKind, StateStore, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// File-backed frontier storage
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    blocked_path: PathBuf,
    open_path: PathBuf,
    books_path: PathBuf,
}

impl JsonStateStore {
    pub fn new(
        blocked_path: impl Into<PathBuf>,
        open_path: impl Into<PathBuf>,
        books_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            blocked_path: blocked_path.into(),
            open_path: open_path.into(),
            books_path: books_path.into(),
        }
    }

    /// Builds a store from the configured state file locations
    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new(
            &output.blocked_subjects_path,
            &output.open_subjects_path,
            &output.book_links_path,
        )
    }

    /// The file backing an aggregate
    pub fn path(&self, kind: AggregateKind) -> &Path {
        match kind {
            AggregateKind::BlockedSubjects => &self.blocked_path,
            AggregateKind::OpenSubjects => &self.open_path,
            AggregateKind::BookLinks => &self.books_path,
        }
    }

    fn read<T: DeserializeOwned + Default>(&self, kind: AggregateKind) -> StorageResult<T> {
        read_json_or_default(self.path(kind))
    }

    fn write<T: Serialize>(&self, kind: AggregateKind, value: &T) -> StorageResult<()> {
        write_json_atomic(self.path(kind), value)?;
        tracing::debug!("Saved {} to {}", kind, self.path(kind).display());
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn load_blocked(&self) -> StorageResult<BlockList> {
        self.read(AggregateKind::BlockedSubjects)
    }

    fn load_open(&self) -> StorageResult<OpenFrontier> {
        self.read(AggregateKind::OpenSubjects)
    }

    fn load_books(&self) -> StorageResult<BookFrontier> {
        self.read(AggregateKind::BookLinks)
    }

    fn save_blocked(&self, blocked: &BlockList) -> StorageResult<()> {
        self.write(AggregateKind::BlockedSubjects, blocked)
    }

    fn save_open(&self, frontier: &OpenFrontier) -> StorageResult<()> {
        self.write(AggregateKind::OpenSubjects, frontier)
    }

    fn save_books(&self, frontier: &BookFrontier) -> StorageResult<()> {
        self.write(AggregateKind::BookLinks, frontier)
    }
}

/// Reads a JSON document, treating a missing file as the empty default
pub(crate) fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> StorageResult<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|source| StorageError::Serialization {
        path: path.display().to_string(),
        source,
    })
}

/// Writes a JSON document through a temporary sibling file
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let io_err = |source| StorageError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let body = serde_json::to_string_pretty(value).map_err(|source| {
        StorageError::Serialization {
            path: path.display().to_string(),
            source,
        }
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, body).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BookRef, Subject};
    use chrono::NaiveDate;
    use tempfile::TempDir;
    use url::Url;

    fn store_in(dir: &TempDir) -> JsonStateStore {
        JsonStateStore::new(
            dir.path().join("blocked.json"),
            dir.path().join("subjects/open.json"),
            dir.path().join("subjects/books.json"),
        )
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.load_blocked().unwrap(), BlockList::default());
        assert_eq!(store.load_open().unwrap(), OpenFrontier::default());
        assert_eq!(store.load_books().unwrap(), BookFrontier::default());
    }

    #[test]
    fn test_save_creates_parent_and_reloads() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let link = Url::parse("https://openlibrary.org/books/OL1M").unwrap();
        let mut books = BookFrontier::default();
        books.admit(BookRef::new(&link), 10);
        books.refresh(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

        store.save_books(&books).unwrap();
        assert!(dir.path().join("subjects/books.json").exists());
        assert!(!dir.path().join("subjects/books.json.tmp").exists());
        assert_eq!(store.load_books().unwrap(), books);
    }

    #[test]
    fn test_written_layout_uses_snake_case_keys() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let link = Url::parse("https://openlibrary.org/subjects/fiction").unwrap();
        let mut open = OpenFrontier::default();
        open.subjects.push(Subject::new("Fiction", &link));
        open.refresh(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        store.save_open(&open).unwrap();

        let raw = std::fs::read_to_string(store.path(AggregateKind::OpenSubjects)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["total_subjects"], 1);
        assert_eq!(json["date_updated"], "2024-05-01");
        assert_eq!(json["subjects"][0]["subject_name"], "Fiction");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(dir.path().join("blocked.json"), "{ not json").unwrap();

        assert!(matches!(
            store.load_blocked(),
            Err(StorageError::Serialization { .. })
        ));
    }
}
