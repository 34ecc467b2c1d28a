//! Frontier aggregates persisted between runs
//!
//! Each aggregate owns an ordered list plus counters derived from it. The counters are
//! only meaningful after [`OpenFrontier::refresh`] / [`BookFrontier::refresh`], which every
//! caller runs right before persisting.

use crate::state::{BookRef, Subject};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of offering one candidate to a frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Appended to the frontier
    Admitted,
    /// Already present
    Duplicate,
    /// Present in the block-list
    Blocked,
    /// The frontier is at its cap
    LimitReached,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Curated subjects that are never crawled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockList {
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl BlockList {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self { subjects }
    }

    pub fn contains(&self, subject: &Subject) -> bool {
        self.subjects.contains(subject)
    }
}

/// Subjects eligible for crawling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenFrontier {
    #[serde(default)]
    pub subjects: Vec<Subject>,

    #[serde(default)]
    pub total_subjects: usize,

    #[serde(default)]
    pub date_updated: Option<NaiveDate>,
}

impl OpenFrontier {
    /// Whether no further subject can be admitted
    pub fn limit_reached(&self, limit: usize) -> bool {
        self.subjects.len() >= limit
    }

    /// Offers one subject, enforcing dedup, the block-list and the cap
    pub fn admit(&mut self, subject: Subject, blocked: &BlockList, limit: usize) -> Admission {
        if self.subjects.contains(&subject) {
            return Admission::Duplicate;
        }

        if blocked.contains(&subject) {
            return Admission::Blocked;
        }

        if self.limit_reached(limit) {
            return Admission::LimitReached;
        }

        self.subjects.push(subject);
        Admission::Admitted
    }

    /// Recomputes `total_subjects` and stamps the update date
    pub fn refresh(&mut self, today: NaiveDate) {
        self.total_subjects = self.subjects.len();
        self.date_updated = Some(today);
    }
}

/// Book detail links awaiting extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookFrontier {
    #[serde(default)]
    pub books: Vec<BookRef>,

    #[serde(default)]
    pub total_book_links: usize,

    #[serde(default)]
    pub total_book_not_scraped: usize,

    #[serde(default)]
    pub date_updated: Option<NaiveDate>,
}

impl BookFrontier {
    pub fn contains(&self, link: &str) -> bool {
        self.books.iter().any(|book| book.link == link)
    }

    /// Number of entries still waiting for extraction
    pub fn not_scraped(&self) -> usize {
        self.books.iter().filter(|book| !book.is_scraped).count()
    }

    /// Whether enough unscraped work is already queued to skip discovery
    pub fn backlog_full(&self, limit: usize) -> bool {
        self.not_scraped() >= limit
    }

    /// Whether the list itself is at its cap
    pub fn cap_reached(&self, limit: usize) -> bool {
        self.books.len() >= limit
    }

    /// Offers one book, enforcing dedup by link and the cap
    pub fn admit(&mut self, book: BookRef, limit: usize) -> Admission {
        if self.contains(&book.link) {
            return Admission::Duplicate;
        }

        if self.cap_reached(limit) {
            return Admission::LimitReached;
        }

        self.books.push(book);
        Admission::Admitted
    }

    /// Flags a book as extracted
    ///
    /// Returns true only on the false -> true transition.
    pub fn mark_scraped(&mut self, link: &str) -> bool {
        match self.books.iter_mut().find(|book| book.link == link) {
            Some(book) if !book.is_scraped => {
                book.is_scraped = true;
                true
            }
            _ => false,
        }
    }

    /// Recomputes both totals and stamps the update date
    pub fn refresh(&mut self, today: NaiveDate) {
        self.total_book_links = self.books.len();
        self.total_book_not_scraped = self.not_scraped();
        self.date_updated = Some(today);
    }
}
