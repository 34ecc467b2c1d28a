//! Frontier entries: category subjects and book detail links

use serde::{Deserialize, Serialize};
use url::Url;

/// A catalog category with its canonical link
///
/// Two subjects are the same entry only when both name and link match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "subject_name")]
    pub name: String,

    #[serde(rename = "subject_link")]
    pub link: String,
}

impl Subject {
    pub fn new(name: impl Into<String>, link: &Url) -> Self {
        Self {
            name: name.into(),
            link: link.to_string(),
        }
    }
}

/// A discovered book detail page
///
/// Identified by `link`; `is_scraped` flips to true once a record has been extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
    #[serde(rename = "book_link")]
    pub link: String,

    #[serde(default)]
    pub is_scraped: bool,
}

impl BookRef {
    /// A freshly discovered, not yet scraped book
    pub fn new(link: &Url) -> Self {
        Self {
            link: link.to_string(),
            is_scraped: false,
        }
    }
}
