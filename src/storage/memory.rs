//! In-memory storage backend
//!
//! Keeps each aggregate as a JSON value so it goes through the same serde layout as the
//! file store. Used by tests.

use crate::state::{BlockList, BookFrontier, OpenFrontier, Subject};
use crate::storage::traits::{AggregateKind, StateStore, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<AggregateKind, serde_json::Value>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose block-list is already populated
    pub fn with_blocked(subjects: Vec<Subject>) -> Self {
        let store = Self::new();
        if let Ok(value) = serde_json::to_value(BlockList::new(subjects)) {
            store
                .documents
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(AggregateKind::BlockedSubjects, value);
        }
        store
    }

    /// Seeds the store from existing frontiers
    pub fn seeded(open: &OpenFrontier, books: &BookFrontier) -> StorageResult<Self> {
        let store = Self::new();
        store.put(AggregateKind::OpenSubjects, open)?;
        store.put(AggregateKind::BookLinks, books)?;
        Ok(store)
    }

    /// Number of successful saves since creation
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn get<T: DeserializeOwned + Default>(&self, kind: AggregateKind) -> StorageResult<T> {
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        match documents.get(&kind) {
            Some(value) => serde_json::from_value(value.clone()).map_err(|source| {
                StorageError::Serialization {
                    path: kind.to_string(),
                    source,
                }
            }),
            None => Ok(T::default()),
        }
    }

    fn put<T: Serialize>(&self, kind: AggregateKind, value: &T) -> StorageResult<()> {
        let value = serde_json::to_value(value).map_err(|source| StorageError::Serialization {
            path: kind.to_string(),
            source,
        })?;
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, value);
        Ok(())
    }

    fn save<T: Serialize>(&self, kind: AggregateKind, value: &T) -> StorageResult<()> {
        self.put(kind, value)?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl StateStore for MemoryStore {
    fn load_blocked(&self) -> StorageResult<BlockList> {
        self.get(AggregateKind::BlockedSubjects)
    }

    fn load_open(&self) -> StorageResult<OpenFrontier> {
        self.get(AggregateKind::OpenSubjects)
    }

    fn load_books(&self) -> StorageResult<BookFrontier> {
        self.get(AggregateKind::BookLinks)
    }

    fn save_blocked(&self, blocked: &BlockList) -> StorageResult<()> {
        self.save(AggregateKind::BlockedSubjects, blocked)
    }

    fn save_open(&self, frontier: &OpenFrontier) -> StorageResult<()> {
        self.save(AggregateKind::OpenSubjects, frontier)
    }

    fn save_books(&self, frontier: &BookFrontier) -> StorageResult<()> {
        self.save(AggregateKind::BookLinks, frontier)
    }
}
