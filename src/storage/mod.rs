//! Storage module for persisting crawl state
//!
//! This module handles persistence of the three frontier aggregates:
//! - The curated subject block-list (read only by the crawler)
//! - The open subject frontier
//! - The book link frontier with per-entry scraped flags
//!
//! Files use the same JSON layout as earlier runs, so a crawl can be stopped at any
//! point and resumed from what was last written.

mod json;
mod memory;
mod traits;

pub use json::JsonStateStore;
pub use memory::MemoryStore;
pub use traits::{AggregateKind, StateStore, StorageError, StorageResult};

pub(crate) use json::{read_json_or_default, write_json_atomic};

use crate::config::OutputConfig;
use crate::state::{BookFrontier, OpenFrontier};

/// Opens the file-backed store for the configured state paths
///
/// Nothing is read until the crawl state is loaded; missing files count as empty.
pub fn open_store(output: &OutputConfig) -> JsonStateStore {
    JsonStateStore::from_config(output)
}

/// Empties both crawl frontiers, leaving the curated block-list untouched
pub fn reset_frontiers(store: &dyn StateStore) -> StorageResult<()> {
    store.save_open(&OpenFrontier::default())?;
    store.save_books(&BookFrontier::default())?;
    tracing::info!("Reset open subject and book link frontiers");
    Ok(())
}
