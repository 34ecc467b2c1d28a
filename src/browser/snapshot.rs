//! Point-in-time views of a page's DOM
//!
//! `scraper::Html` is not `Send`, so a snapshot keeps only the serialized markup and parses
//! it inside each synchronous query. Nothing parsed ever lives across an `.await`.

use crate::browser::{BrowserError, BrowserResult};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

fn parse_selector(css: &str) -> BrowserResult<Selector> {
    Selector::parse(css).map_err(|_| BrowserError::Selector(css.to_string()))
}

/// Trimmed concatenation of every text node below an element
fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Serialized page markup
#[derive(Debug, Clone, Default)]
pub struct DomSnapshot {
    html: String,
}

impl DomSnapshot {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Whether at least one element matches
    pub fn exists(&self, css: &str) -> BrowserResult<bool> {
        let selector = parse_selector(css)?;
        let document = Html::parse_document(&self.html);
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }

    /// Trimmed text of the first match, `None` when absent or blank
    pub fn first_text(&self, css: &str) -> BrowserResult<Option<String>> {
        let selector = parse_selector(css)?;
        let document = Html::parse_document(&self.html);
        let text = document
            .select(&selector)
            .next()
            .map(|element| element_text(&element))
            .and_then(non_empty);
        Ok(text)
    }

    /// Trimmed attribute of the first match, `None` when absent or blank
    pub fn first_attribute(&self, css: &str, name: &str) -> BrowserResult<Option<String>> {
        let selector = parse_selector(css)?;
        let document = Html::parse_document(&self.html);
        let value = document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr(name))
            .map(|value| value.trim().to_string())
            .and_then(non_empty);
        Ok(value)
    }

    /// Every match in document order
    pub fn select_all(&self, css: &str) -> BrowserResult<Vec<ElementSnapshot>> {
        let selector = parse_selector(css)?;
        let document = Html::parse_document(&self.html);
        let elements = document
            .select(&selector)
            .map(|element| ElementSnapshot::from_element(&element))
            .collect();
        Ok(elements)
    }
}

/// One matched element, detached from its document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSnapshot {
    /// Trimmed text content
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    /// Outer HTML, used for sub-queries
    pub html: String,
}

impl ElementSnapshot {
    fn from_element(element: &ElementRef<'_>) -> Self {
        let attributes = element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        Self {
            text: element_text(element),
            attributes,
            html: element.html(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Trimmed text of the first descendant matching `css`
    pub fn select_text(&self, css: &str) -> BrowserResult<Option<String>> {
        let selector = parse_selector(css)?;
        let fragment = Html::parse_fragment(&self.html);
        let text = fragment
            .select(&selector)
            .next()
            .map(|element| element_text(&element))
            .and_then(non_empty);
        Ok(text)
    }
}
