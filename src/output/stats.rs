//! Statistics generation from the crawl state files
//!
//! This module provides functionality for summarizing and displaying the frontiers and
//! the records file without starting a crawl.

use crate::output::records::load_records;
use crate::storage::{StateStore, StorageResult};
use chrono::NaiveDate;
use std::path::Path;

/// Frontier statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontierStatistics {
    pub blocked_subjects: usize,
    pub open_subjects: usize,
    pub subject_limit: usize,
    pub book_links: usize,
    pub books_not_scraped: usize,
    pub book_limit: usize,
    pub records: usize,
    pub subjects_updated: Option<NaiveDate>,
    pub books_updated: Option<NaiveDate>,
}

impl FrontierStatistics {
    pub fn books_scraped(&self) -> usize {
        self.book_links - self.books_not_scraped
    }
}

/// Loads statistics from the state store and the records file
///
/// Counts are taken from the live lists rather than the stored totals.
pub fn load_statistics(
    store: &dyn StateStore,
    records_path: &Path,
    subject_limit: usize,
    book_limit: usize,
) -> StorageResult<FrontierStatistics> {
    let blocked = store.load_blocked()?;
    let open = store.load_open()?;
    let books = store.load_books()?;
    let records = load_records(records_path)?;

    Ok(FrontierStatistics {
        blocked_subjects: blocked.subjects.len(),
        open_subjects: open.subjects.len(),
        subject_limit,
        book_links: books.books.len(),
        books_not_scraped: books.not_scraped(),
        book_limit,
        records: records.records.len(),
        subjects_updated: open.date_updated,
        books_updated: books.date_updated,
    })
}

fn updated(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &FrontierStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Subjects:");
    println!("  Blocked: {}", stats.blocked_subjects);
    println!(
        "  Open: {} / {} (updated {})",
        stats.open_subjects,
        stats.subject_limit,
        updated(stats.subjects_updated)
    );
    println!();

    println!("Book links:");
    println!(
        "  Total: {} / {} (updated {})",
        stats.book_links,
        stats.book_limit,
        updated(stats.books_updated)
    );
    println!("  Scraped: {}", stats.books_scraped());
    println!("  Not scraped: {}", stats.books_not_scraped);
    println!();

    let progress = if stats.book_links > 0 {
        (stats.books_scraped() as f64 / stats.book_links as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Extraction progress: {:.1}% ({} records on file)",
        progress, stats.records
    );
}
