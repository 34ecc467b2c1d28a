use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Shelfmark
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub site: SiteConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Which page automation backend drives the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Plain HTTP fetches parsed with scraper; "next" controls must carry an href
    #[default]
    Static,
    /// Chrome over the DevTools protocol (requires the `browser` feature)
    Chrome,
}

/// Crawl policy parameters
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of subjects held in the open-subject frontier
    #[serde(rename = "subject-limit", default = "default_subject_limit")]
    pub subject_limit: usize,

    /// Maximum number of book links held in the book frontier
    #[serde(rename = "book-limit", default = "default_book_limit")]
    pub book_limit: usize,

    /// Number of subject pages paginated concurrently
    #[serde(rename = "worker-pool-size", default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    /// Maximum "next" clicks per subject page
    #[serde(rename = "max-pagination-steps", default = "default_max_pagination_steps")]
    pub max_pagination_steps: usize,

    /// Whether the browser window stays hidden
    ///
    /// Only the chrome engine opens a window; the static engine ignores this.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Page automation backend
    #[serde(default)]
    pub engine: Engine,

    /// Delay before each subject navigation (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Per-field read timeout (milliseconds)
    #[serde(rename = "field-timeout", default = "default_field_timeout")]
    pub field_timeout: u64,

    /// Candidate pauses after each "next" click (milliseconds)
    #[serde(default = "default_jitter")]
    pub jitter: Vec<u64>,

    /// Book pages extracted at the same time
    #[serde(rename = "metadata-concurrency", default = "default_metadata_concurrency")]
    pub metadata_concurrency: usize,

    /// Fetch robots.txt and skip disallowed URLs
    #[serde(rename = "respect-robots", default = "default_respect_robots")]
    pub respect_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            subject_limit: default_subject_limit(),
            book_limit: default_book_limit(),
            worker_pool_size: default_worker_pool_size(),
            max_pagination_steps: default_max_pagination_steps(),
            headless: default_headless(),
            engine: Engine::default(),
            politeness_delay: default_politeness_delay(),
            field_timeout: default_field_timeout(),
            jitter: default_jitter(),
            metadata_concurrency: default_metadata_concurrency(),
            respect_robots: default_respect_robots(),
        }
    }
}

fn default_subject_limit() -> usize {
    50
}

fn default_book_limit() -> usize {
    50
}

fn default_worker_pool_size() -> usize {
    3
}

fn default_max_pagination_steps() -> usize {
    10
}

fn default_headless() -> bool {
    true
}

fn default_politeness_delay() -> u64 {
    10_000
}

fn default_field_timeout() -> u64 {
    1_000
}

fn default_jitter() -> Vec<u64> {
    vec![1_000, 500, 1_500]
}

fn default_metadata_concurrency() -> usize {
    1
}

fn default_respect_robots() -> bool {
    true
}

/// Identity presented to the catalog site
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Browser user agent string
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Name of the crawler, used for the bot signature header and robots.txt matching
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Short statement of why the site is being crawled
    pub purpose: String,

    /// Additional request headers
    #[serde(rename = "extra-headers", default)]
    pub extra_headers: BTreeMap<String, String>,
}

/// Catalog site being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin every relative link is qualified against
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Listing page used to seed the subject frontier
    #[serde(rename = "subjects-path", default = "default_subjects_path")]
    pub subjects_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            subjects_path: default_subjects_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_subjects_path() -> String {
    "/subjects/".to_string()
}

/// State and output file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Curated list of subjects that are never crawled
    #[serde(rename = "blocked-subjects-path")]
    pub blocked_subjects_path: String,

    /// Open subject frontier
    #[serde(rename = "open-subjects-path")]
    pub open_subjects_path: String,

    /// Book link frontier
    #[serde(rename = "book-links-path")]
    pub book_links_path: String,

    /// Extracted book records
    #[serde(rename = "records-path")]
    pub records_path: String,
}

/// CSS selectors for the catalog's markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    #[serde(rename = "subject-links")]
    pub subject_links: String,
    #[serde(rename = "book-links")]
    pub book_links: String,
    /// Pagination control
    ///
    /// The static engine follows the control's `href`. openlibrary's default
    /// `button.slick-next` has none and only works with the chrome engine.
    #[serde(rename = "next-button")]
    pub next_button: String,
    #[serde(rename = "next-disabled-attribute")]
    pub next_disabled_attribute: String,
    #[serde(rename = "title-block")]
    pub title_block: String,
    pub title: String,
    pub subtitle: String,
    pub authors: String,
    #[serde(rename = "rating-value")]
    pub rating_value: String,
    #[serde(rename = "rating-count")]
    pub rating_count: String,
    #[serde(rename = "reading-log-stat")]
    pub reading_log_stat: String,
    #[serde(rename = "stat-count")]
    pub stat_count: String,
    #[serde(rename = "stat-label")]
    pub stat_label: String,
    pub description: String,
    #[serde(rename = "edition-block")]
    pub edition_block: String,
    #[serde(rename = "published-date")]
    pub published_date: String,
    #[serde(rename = "edition-item")]
    pub edition_item: String,
    #[serde(rename = "publisher-label")]
    pub publisher_label: String,
    pub language: String,
    #[serde(rename = "num-pages")]
    pub num_pages: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            subject_links: r#"a[href*="/subjects/"], a[href*="/search"][href*="subject%3A"]"#
                .to_string(),
            book_links: r#"a[href^="/books/"]"#.to_string(),
            next_button: "button.slick-next".to_string(),
            next_disabled_attribute: "aria-disabled".to_string(),
            title_block: "div.work-title-and-author.desktop".to_string(),
            title: "span > h1.work-title".to_string(),
            subtitle: "span > h2.work-subtitle".to_string(),
            authors: "h2.edition-byline a".to_string(),
            rating_value: r#"meta[itemprop="ratingValue"]"#.to_string(),
            rating_count: r#"meta[itemprop="ratingCount"]"#.to_string(),
            reading_log_stat: "li.reading-log-stat".to_string(),
            stat_count: ".readers-stats__stat".to_string(),
            stat_label: ".readers-stats__label".to_string(),
            description: "div.read-more__content.markdown-content".to_string(),
            edition_block: "div.edition-omniline".to_string(),
            published_date: r#"span[itemprop="datePublished"]"#.to_string(),
            edition_item: "div.edition-omniline-item".to_string(),
            publisher_label: "Publisher".to_string(),
            language: r#"span[itemprop="inLanguage"] a"#.to_string(),
            num_pages: r#"span[itemprop="numberOfPages"]"#.to_string(),
        }
    }
}

impl SelectorConfig {
    /// Joins a block selector and a child selector into one descendant selector
    pub fn within(block: &str, child: &str) -> String {
        format!("{} {}", block, child)
    }

    /// Every selector paired with its config key, for validation
    pub fn css_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("subject-links", &self.subject_links),
            ("book-links", &self.book_links),
            ("next-button", &self.next_button),
            ("title-block", &self.title_block),
            ("title", &self.title),
            ("subtitle", &self.subtitle),
            ("authors", &self.authors),
            ("rating-value", &self.rating_value),
            ("rating-count", &self.rating_count),
            ("reading-log-stat", &self.reading_log_stat),
            ("stat-count", &self.stat_count),
            ("stat-label", &self.stat_label),
            ("description", &self.description),
            ("edition-block", &self.edition_block),
            ("published-date", &self.published_date),
            ("edition-item", &self.edition_item),
            ("language", &self.language),
            ("num-pages", &self.num_pages),
        ]
    }
}
