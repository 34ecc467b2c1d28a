//! Fault-isolated field reads
//!
//! Reads never fail. A missing element, a blank value, a bad selector or a timeout all
//! come back as "absent", and the caller picks the default.

use crate::browser::{ElementSnapshot, PageDriver};
use std::time::Duration;

/// Placeholder stored for string fields that could not be read
pub const NO_DATA: &str = "No Data";

/// What to read from the first matching element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode<'a> {
    Text,
    Attribute(&'a str),
}

/// Reads single values from one page, each bounded by the same timeout
pub struct FieldExtractor<'p> {
    page: &'p dyn PageDriver,
    timeout: Duration,
}

impl<'p> FieldExtractor<'p> {
    pub fn new(page: &'p dyn PageDriver, timeout: Duration) -> Self {
        Self { page, timeout }
    }

    /// The value, or `None` when it could not be read in time
    pub async fn optional(&self, selector: &str, mode: ReadMode<'_>) -> Option<String> {
        let read = async {
            match mode {
                ReadMode::Text => self.page.read_text(selector, self.timeout).await,
                ReadMode::Attribute(name) => {
                    self.page.read_attribute(selector, name, self.timeout).await
                }
            }
        };

        match tokio::time::timeout(self.timeout, read).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::debug!("Field {} unreadable: {}", selector, e);
                None
            }
            Err(_) => {
                tracing::debug!("Field {} timed out after {:?}", selector, self.timeout);
                None
            }
        }
    }

    /// The value, or `default` when it could not be read in time
    pub async fn fetch(&self, selector: &str, mode: ReadMode<'_>, default: &str) -> String {
        self.optional(selector, mode)
            .await
            .unwrap_or_else(|| default.to_string())
    }

    /// `projection` applied to every match, skipping elements it rejects
    pub async fn fetch_all<T, F>(&self, selector: &str, projection: F) -> Vec<T>
    where
        F: Fn(&ElementSnapshot) -> Option<T>,
    {
        match tokio::time::timeout(self.timeout, self.page.evaluate_all(selector)).await {
            Ok(Ok(elements)) => elements.iter().filter_map(projection).collect(),
            Ok(Err(e)) => {
                tracing::debug!("Fields {} unreadable: {}", selector, e);
                Vec::new()
            }
            Err(_) => {
                tracing::debug!("Fields {} timed out after {:?}", selector, self.timeout);
                Vec::new()
            }
        }
    }
}
