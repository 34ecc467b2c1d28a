//! Crawl state shared between concurrent workers
//!
//! Every check-then-append and every persist runs under the lock of the aggregate it
//! touches, so concurrent workers never exceed a cap and never interleave a write.

use crate::state::{Admission, BlockList, BookFrontier, BookRef, OpenFrontier, Subject};
use crate::storage::{StateStore, StorageResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Caps applied to the two frontiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub subjects: usize,
    pub books: usize,
}

/// The loaded frontiers plus the store they are written back to
pub struct CrawlState {
    store: Arc<dyn StateStore>,
    blocked: BlockList,
    open: Mutex<OpenFrontier>,
    books: Mutex<BookFrontier>,
    limits: Limits,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

impl CrawlState {
    /// Loads all three aggregates from the store
    pub fn load(store: Arc<dyn StateStore>, limits: Limits) -> StorageResult<Self> {
        let blocked = store.load_blocked()?;
        let mut open = store.load_open()?;
        let books = store.load_books()?;

        // The block-list may have grown since the frontier was written
        let before = open.subjects.len();
        open.subjects.retain(|subject| !blocked.contains(subject));
        if open.subjects.len() < before {
            tracing::info!(
                "Dropped {} blocked subjects from the open frontier",
                before - open.subjects.len()
            );
        }

        tracing::info!(
            "Loaded state: {} blocked, {} open subjects, {} books ({} unscraped)",
            blocked.subjects.len(),
            open.subjects.len(),
            books.books.len(),
            books.not_scraped()
        );

        Ok(Self {
            store,
            blocked,
            open: Mutex::new(open),
            books: Mutex::new(books),
            limits,
        })
    }

    /// Offers a subject to the open frontier
    pub fn admit_subject(&self, subject: Subject) -> Admission {
        lock(&self.open).admit(subject, &self.blocked, self.limits.subjects)
    }

    /// Offers a book to the book frontier
    pub fn admit_book(&self, book: BookRef) -> Admission {
        lock(&self.books).admit(book, self.limits.books)
    }

    pub fn subject_limit_reached(&self) -> bool {
        lock(&self.open).limit_reached(self.limits.subjects)
    }

    pub fn book_backlog_full(&self) -> bool {
        lock(&self.books).backlog_full(self.limits.books)
    }

    pub fn book_cap_reached(&self) -> bool {
        lock(&self.books).cap_reached(self.limits.books)
    }

    /// Refreshes the open frontier's derived fields and writes it out
    pub fn persist_subjects(&self) -> StorageResult<()> {
        let mut open = lock(&self.open);
        open.refresh(today());
        self.store.save_open(&open)
    }

    /// Refreshes the book frontier's derived fields and writes it out
    pub fn persist_books(&self) -> StorageResult<()> {
        let mut books = lock(&self.books);
        books.refresh(today());
        self.store.save_books(&books)
    }

    /// Flags a book as extracted and persists the frontier
    ///
    /// Returns whether the flag actually changed.
    pub fn mark_scraped(&self, link: &str) -> StorageResult<bool> {
        let mut books = lock(&self.books);
        let changed = books.mark_scraped(link);
        if changed {
            books.refresh(today());
            self.store.save_books(&books)?;
        }
        Ok(changed)
    }

    /// Snapshot of the open subjects in frontier order
    pub fn open_subjects(&self) -> Vec<Subject> {
        lock(&self.open).subjects.clone()
    }

    /// Snapshot of the whole book frontier
    pub fn books(&self) -> BookFrontier {
        lock(&self.books).clone()
    }

    /// Books still waiting for extraction, in frontier order
    pub fn unscraped_books(&self) -> Vec<BookRef> {
        lock(&self.books)
            .books
            .iter()
            .filter(|book| !book.is_scraped)
            .cloned()
            .collect()
    }
}
