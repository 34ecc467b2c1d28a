//! Output module for extracted records and crawl statistics
//!
//! This module handles:
//! - Merging each session's book records into the records file
//! - Summarizing the frontiers for the `--stats` mode

mod records;
pub mod stats;

pub use records::{load_records, merge_records, RecordsFile};
pub use stats::{load_statistics, print_statistics, FrontierStatistics};
