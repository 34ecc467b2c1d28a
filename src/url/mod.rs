//! URL handling module for Shelfmark
//!
//! This module turns raw anchor hrefs found on catalog pages into canonical subject
//! and book URLs. Links that match neither shape are dropped without error.

mod normalize;

// Re-export main functions
pub use normalize::{normalize_subject_link, parse_base_url, qualify_book_link, subject_slug};
