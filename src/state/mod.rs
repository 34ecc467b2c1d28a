//! State module for tracking crawl progress
//!
//! This module holds the frontiers that survive between runs.
//!
//! # Components
//!
//! - `Subject` / `BookRef`: single frontier entries
//! - `OpenFrontier` / `BookFrontier` / `BlockList`: the persisted aggregates
//! - `CrawlState`: the aggregates behind locks, shared by concurrent workers

mod frontier;
mod shared;
mod subject;

// Re-export main types
pub use frontier::{Admission, BlockList, BookFrontier, OpenFrontier};
pub use shared::{CrawlState, Limits};
pub use subject::{BookRef, Subject};
