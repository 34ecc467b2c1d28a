//! Crawler module for catalog discovery and extraction
//!
//! This module contains the core crawling logic, including:
//! - Fault-isolated field reads
//! - Subject link discovery and normalization
//! - Paginated book link discovery
//! - Book metadata extraction
//! - Politeness delays and jitter
//! - Overall session coordination

mod books;
mod coordinator;
mod field;
mod metadata;
mod pacing;
mod site;
mod subjects;

pub use books::{BookHarvest, BookLinkCollector};
pub use coordinator::{run_session, Coordinator};
pub use field::{FieldExtractor, ReadMode, NO_DATA};
pub use metadata::{BookMetadataExtractor, BookRecord};
pub use pacing::Pacing;
pub use site::Site;
pub use subjects::SubjectLinkCollector;
