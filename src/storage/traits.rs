//! Storage traits and error types
//!
//! This module defines the trait interface for frontier persistence backends and
//! associated error types.

use crate::state::{BlockList, BookFrontier, OpenFrontier};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error on {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The three persisted aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    BlockedSubjects,
    OpenSubjects,
    BookLinks,
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BlockedSubjects => "blocked subjects",
            Self::OpenSubjects => "open subjects",
            Self::BookLinks => "book links",
        };
        f.write_str(name)
    }
}

/// Trait for frontier persistence backends
///
/// Every save overwrites the whole aggregate. Loading an aggregate that was never saved
/// yields its empty default. Calls block until the data is durable.
pub trait StateStore: Send + Sync {
    /// Loads the curated block-list
    fn load_blocked(&self) -> StorageResult<BlockList>;

    /// Loads the open subject frontier
    fn load_open(&self) -> StorageResult<OpenFrontier>;

    /// Loads the book link frontier
    fn load_books(&self) -> StorageResult<BookFrontier>;

    /// Replaces the block-list
    fn save_blocked(&self, blocked: &BlockList) -> StorageResult<()>;

    /// Replaces the open subject frontier
    fn save_open(&self, frontier: &OpenFrontier) -> StorageResult<()>;

    /// Replaces the book link frontier
    fn save_books(&self, frontier: &BookFrontier) -> StorageResult<()>;
}
