//! Book detail page extraction

use crate::browser::PageDriver;
use crate::config::SelectorConfig;
use crate::crawler::field::{FieldExtractor, ReadMode, NO_DATA};
use crate::url::subject_slug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Structured metadata for one book
///
/// String fields that could not be read hold `"No Data"`; ratings that are absent are
/// `None` rather than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Detail page the record was extracted from
    pub link: String,
    pub title: String,
    pub subtitle: String,
    pub authors: Vec<String>,
    pub rating_value: Option<f64>,
    pub rating_count: Option<u64>,
    /// Reading-log counters keyed by normalized label (`want_to_read`, ...)
    pub stats: BTreeMap<String, u64>,
    pub description: String,
    pub published_date: String,
    pub publisher: String,
    pub language: String,
    pub num_pages: String,
}

/// Parses a displayed count such as `"1,204"`
fn parse_count(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(|c| !matches!(c, ',' | '_' | ' ')).collect();
    digits.parse().ok()
}

/// Reads a `BookRecord` off a loaded detail page
#[derive(Debug, Clone)]
pub struct BookMetadataExtractor {
    selectors: SelectorConfig,
    timeout: Duration,
}

impl BookMetadataExtractor {
    pub fn new(selectors: SelectorConfig, timeout: Duration) -> Self {
        Self { selectors, timeout }
    }

    /// Extracts every field independently; a missing field never aborts the record
    pub async fn extract(&self, page: &dyn PageDriver, link: &str) -> BookRecord {
        let s = &self.selectors;
        let fields = FieldExtractor::new(page, self.timeout);
        let title_block = |child: &str| SelectorConfig::within(&s.title_block, child);
        let edition_block = |child: &str| SelectorConfig::within(&s.edition_block, child);

        let title = fields.fetch(&title_block(&s.title), ReadMode::Text, NO_DATA).await;
        let subtitle = fields
            .fetch(&title_block(&s.subtitle), ReadMode::Text, NO_DATA)
            .await;
        let authors = fields
            .fetch_all(&title_block(&s.authors), |anchor| {
                Some(anchor.text.clone()).filter(|name| !name.is_empty())
            })
            .await;

        let rating_value = fields
            .optional(&title_block(&s.rating_value), ReadMode::Attribute("content"))
            .await
            .and_then(|raw| raw.parse::<f64>().ok());
        let rating_count = fields
            .optional(&title_block(&s.rating_count), ReadMode::Attribute("content"))
            .await
            .and_then(|raw| parse_count(&raw));

        let stats = fields
            .fetch_all(&title_block(&s.reading_log_stat), |stat| {
                let label = stat.select_text(&s.stat_label).ok().flatten()?;
                let count = stat
                    .select_text(&s.stat_count)
                    .ok()
                    .flatten()
                    .and_then(|raw| parse_count(&raw))
                    .unwrap_or(0);
                Some((subject_slug(&label), count))
            })
            .await
            .into_iter()
            .filter(|(label, _)| !label.is_empty())
            .collect::<BTreeMap<_, _>>();

        let description = fields.fetch(&s.description, ReadMode::Text, NO_DATA).await;

        let published_date = fields
            .fetch(&edition_block(&s.published_date), ReadMode::Text, NO_DATA)
            .await;
        let publisher = fields
            .fetch_all(&edition_block(&s.edition_item), |item| {
                if !item.text.contains(s.publisher_label.as_str()) {
                    return None;
                }
                item.select_text("a").ok().flatten()
            })
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| NO_DATA.to_string());
        let language = fields
            .fetch(&edition_block(&s.language), ReadMode::Text, NO_DATA)
            .await;
        let num_pages = fields
            .fetch(&edition_block(&s.num_pages), ReadMode::Text, NO_DATA)
            .await;

        BookRecord {
            link: link.to_string(),
            title,
            subtitle,
            authors,
            rating_value,
            rating_count,
            stats,
            description,
            published_date,
            publisher,
            language,
            num_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::ScriptedPage;

    const DETAIL: &str = r#"
        <div class="work-title-and-author desktop">
            <span><h1 class="work-title">The Left Hand of Darkness</h1></span>
            <h2 class="edition-byline">by <a href="/authors/OL1A">Ursula K. Le Guin</a></h2>
            <meta itemprop="ratingValue" content="4.1">
            <meta itemprop="ratingCount" content="1,204">
            <ul>
                <li class="reading-log-stat">
                    <span class="readers-stats__stat">2,310</span>
                    <span class="readers-stats__label">Want to read</span>
                </li>
                <li class="reading-log-stat">
                    <span class="readers-stats__stat">88</span>
                    <span class="readers-stats__label">Currently reading</span>
                </li>
                <li class="reading-log-stat">
                    <span class="readers-stats__stat">5</span>
                    <span class="readers-stats__label">Want to read</span>
                </li>
            </ul>
        </div>
        <div class="read-more__content markdown-content">A human envoy visits Gethen.</div>
        <div class="edition-omniline">
            <div class="edition-omniline-item">
                <div>Publish Date</div>
                <span itemprop="datePublished">1969</span>
            </div>
            <div class="edition-omniline-item">
                <div>Publisher</div>
                <span><a href="/publishers/Ace">Ace Books</a></span>
            </div>
            <div class="edition-omniline-item">
                <div>Language</div>
                <span itemprop="inLanguage"><a href="/languages/eng">English</a></span>
            </div>
            <div class="edition-omniline-item">
                <div>Pages</div>
                <span itemprop="numberOfPages">286</span>
            </div>
        </div>
    "#;

    fn extractor() -> BookMetadataExtractor {
        BookMetadataExtractor::new(SelectorConfig::default(), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_extracts_full_record() {
        let page = ScriptedPage::new(vec![DETAIL.to_string()]);
        let record = extractor()
            .extract(&page, "https://openlibrary.org/books/OL1M")
            .await;

        assert_eq!(record.link, "https://openlibrary.org/books/OL1M");
        assert_eq!(record.title, "The Left Hand of Darkness");
        assert_eq!(record.subtitle, NO_DATA);
        assert_eq!(record.authors, vec!["Ursula K. Le Guin"]);
        assert_eq!(record.rating_value, Some(4.1));
        assert_eq!(record.rating_count, Some(1204));
        assert_eq!(record.description, "A human envoy visits Gethen.");
        assert_eq!(record.published_date, "1969");
        assert_eq!(record.publisher, "Ace Books");
        assert_eq!(record.language, "English");
        assert_eq!(record.num_pages, "286");
    }

    #[tokio::test]
    async fn test_stats_last_label_wins() {
        let page = ScriptedPage::new(vec![DETAIL.to_string()]);
        let record = extractor().extract(&page, "link").await;

        assert_eq!(record.stats.len(), 2);
        assert_eq!(record.stats["want_to_read"], 5);
        assert_eq!(record.stats["currently_reading"], 88);
    }

    #[tokio::test]
    async fn test_missing_rating_keeps_rest_of_record() {
        let without_rating = DETAIL
            .replace(r#"<meta itemprop="ratingValue" content="4.1">"#, "")
            .replace(r#"<meta itemprop="ratingCount" content="1,204">"#, "");
        let page = ScriptedPage::new(vec![without_rating]);
        let record = extractor().extract(&page, "link").await;

        assert_eq!(record.rating_value, None);
        assert_eq!(record.rating_count, None);
        assert_eq!(record.title, "The Left Hand of Darkness");
        assert_eq!(record.publisher, "Ace Books");
    }

    #[tokio::test]
    async fn test_empty_page_yields_defaults() {
        let page = ScriptedPage::new(vec!["<html></html>".to_string()]);
        let record = extractor().extract(&page, "link").await;

        assert_eq!(record.title, NO_DATA);
        assert!(record.authors.is_empty());
        assert!(record.stats.is_empty());
        assert_eq!(record.publisher, NO_DATA);
        assert_eq!(record.num_pages, NO_DATA);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("2,310"), Some(2310));
        assert_eq!(parse_count("88"), Some(88));
        assert_eq!(parse_count("n/a"), None);
    }
}
