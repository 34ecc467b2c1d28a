//! Crawler coordinator - main crawl orchestration logic
//!
//! This module sequences one crawl session:
//! - Seeding the subject frontier from the listing page when it is empty
//! - Paginating the first N subjects concurrently, one page per worker
//! - Extracting metadata for every unscraped book with bounded concurrency
//! - Releasing the browser session

use crate::browser::{self, BrowserContext, PageDriver};
use crate::config::Config;
use crate::crawler::books::BookLinkCollector;
use crate::crawler::metadata::{BookMetadataExtractor, BookRecord};
use crate::crawler::pacing::Pacing;
use crate::crawler::subjects::SubjectLinkCollector;
use crate::crawler::Site;
use crate::robots::{fetch_robots, RobotsGuard};
use crate::state::{BookRef, CrawlState, Limits};
use crate::storage::StateStore;
use crate::{output, Result, ShelfError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Closes a page, logging instead of failing
async fn release(mut page: Box<dyn PageDriver>) {
    if let Err(e) = page.close().await {
        tracing::debug!("Failed to close page: {}", e);
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    state: Arc<CrawlState>,
    site: Arc<Site>,
    browser: Arc<dyn BrowserContext>,
    pacing: Pacing,
}

impl Coordinator {
    pub fn new(
        config: Config,
        state: Arc<CrawlState>,
        site: Arc<Site>,
        browser: Arc<dyn BrowserContext>,
    ) -> Self {
        let pacing = Pacing::from_config(&config.crawler, site.robots());
        Self {
            config: Arc::new(config),
            state,
            site,
            browser,
            pacing,
        }
    }

    /// Replaces the pacing derived from the configuration
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Runs discovery then extraction and returns this session's records
    ///
    /// Worker failures are logged and skipped; only state persistence errors abort.
    pub async fn run(&self) -> Result<Vec<BookRecord>> {
        let start_time = std::time::Instant::now();

        self.seed_subjects().await?;
        let total_books = self.collect_book_links().await?;
        tracing::info!("Book frontier holds {} links", total_books);

        let records = self.extract_metadata().await?;
        tracing::info!(
            "Session finished: {} records extracted in {:?}",
            records.len(),
            start_time.elapsed()
        );
        Ok(records)
    }

    /// Scans the subject listing page when the open frontier is empty
    async fn seed_subjects(&self) -> Result<()> {
        if !self.state.open_subjects().is_empty() {
            return Ok(());
        }

        tracing::info!("Open subject frontier is empty, seeding from listing page");
        let collector = SubjectLinkCollector::new(self.state.clone(), self.site.clone());
        let mut page = self.browser.new_page().await?;
        let result = collector
            .collect(page.as_mut(), Some(self.site.subjects_url()))
            .await;
        release(page).await;

        match result {
            Ok(_) => Ok(()),
            Err(e @ ShelfError::Storage(_)) => Err(e),
            Err(e) => {
                tracing::error!("Seeding subjects failed: {}", e);
                Ok(())
            }
        }
    }

    /// Paginates the first `worker-pool-size` subjects concurrently
    ///
    /// Returns the size of the book frontier afterwards.
    async fn collect_book_links(&self) -> Result<usize> {
        let subjects: Vec<_> = self
            .state
            .open_subjects()
            .into_iter()
            .take(self.config.crawler.worker_pool_size)
            .collect();

        let collector =
            BookLinkCollector::new(self.state.clone(), self.site.clone(), self.pacing.clone());
        let max_steps = self.config.crawler.max_pagination_steps;
        let mut workers = JoinSet::new();

        for subject in subjects {
            let collector = collector.clone();
            let browser = self.browser.clone();
            workers.spawn(async move {
                let link = Url::parse(&subject.link)?;
                let mut page = browser.new_page().await?;
                let result = collector.collect(page.as_mut(), Some(&link), max_steps).await;
                release(page).await;
                tracing::debug!("Worker for {} done", subject.name);
                result
            });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(harvest)) => tracing::debug!(
                    "Worker admitted {} books in {} scans",
                    harvest.newly_admitted,
                    harvest.scans
                ),
                Ok(Err(e @ ShelfError::Storage(_))) => return Err(e),
                Ok(Err(e)) => tracing::warn!("Subject worker failed: {}", e),
                Err(e) => tracing::error!("Subject worker panicked: {}", e),
            }
        }

        Ok(self.state.books().books.len())
    }

    /// Extracts every unscraped book, marking each one scraped as soon as it succeeds
    async fn extract_metadata(&self) -> Result<Vec<BookRecord>> {
        let pending = self.state.unscraped_books();
        if pending.is_empty() {
            tracing::info!("No unscraped books");
            return Ok(Vec::new());
        }
        tracing::info!("Extracting metadata for {} books", pending.len());

        let extractor = Arc::new(BookMetadataExtractor::new(
            self.site.selectors().clone(),
            Duration::from_millis(self.config.crawler.field_timeout),
        ));
        let permits = Arc::new(Semaphore::new(self.config.crawler.metadata_concurrency.max(1)));
        let mut workers = JoinSet::new();

        for (index, book) in pending.into_iter().enumerate() {
            let extractor = extractor.clone();
            let permits = permits.clone();
            let browser = self.browser.clone();
            let site = self.site.clone();
            let state = self.state.clone();
            let pacing = self.pacing.clone();

            workers.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| ShelfError::Worker(e.to_string()))?;
                let record =
                    extract_one(browser.as_ref(), &site, &pacing, &extractor, &book).await?;
                state.mark_scraped(&book.link)?;
                Ok::<_, ShelfError>((index, record))
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(indexed)) => records.push(indexed),
                Ok(Err(e @ ShelfError::Storage(_))) => return Err(e),
                Ok(Err(e)) => tracing::warn!("Book extraction failed: {}", e),
                Err(e) => tracing::error!("Book worker panicked: {}", e),
            }
        }

        records.sort_by_key(|(index, _)| *index);
        Ok(records.into_iter().map(|(_, record)| record).collect())
    }
}

/// Opens a page on one book and reads its record
async fn extract_one(
    browser: &dyn BrowserContext,
    site: &Site,
    pacing: &Pacing,
    extractor: &BookMetadataExtractor,
    book: &BookRef,
) -> Result<BookRecord> {
    let link = Url::parse(&book.link)?;
    let mut page = browser.new_page().await?;

    pacing.before_detail(page.as_ref()).await;
    if let Err(e) = site.navigate(page.as_mut(), &link).await {
        release(page).await;
        return Err(e);
    }

    let record = extractor.extract(page.as_ref(), &book.link).await;
    release(page).await;
    tracing::debug!("Extracted {}", book.link);
    Ok(record)
}

/// Runs one complete crawl session against the configured catalog
///
/// This function:
/// 1. Loads the three frontiers from `store`
/// 2. Fetches robots.txt (when `respect-robots` is set)
/// 3. Starts the configured page backend
/// 4. Runs the coordinator
/// 5. Merges the new records into the records file
/// 6. Closes the browser session, even when the run failed
///
/// # Example
///
/// ```no_run
/// use shelfmark::config::load_config;
/// use shelfmark::crawler::run_session;
/// use shelfmark::storage::open_store;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("shelfmark.toml"))?;
/// let store = Arc::new(open_store(&config.output));
/// let records = run_session(config, store).await?;
/// println!("{} books extracted", records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_session(config: Config, store: Arc<dyn StateStore>) -> Result<Vec<BookRecord>> {
    let limits = Limits {
        subjects: config.crawler.subject_limit,
        books: config.crawler.book_limit,
    };
    let state = Arc::new(CrawlState::load(store, limits)?);

    let robots = if config.crawler.respect_robots {
        let client = browser::build_http_client(&config.identity)?;
        let base = crate::url::parse_base_url(&config.site.base_url)?;
        let policy = fetch_robots(&client, &base).await;
        RobotsGuard::new(policy, config.identity.crawler_name.clone())
    } else {
        RobotsGuard::allow_all()
    };

    let site = Arc::new(Site::new(&config.site, config.selectors.clone(), robots)?);
    let records_path = config.output.records_path.clone();
    let browser = browser::launch(&config).await?;

    let coordinator = Coordinator::new(config, state, site, browser.clone());
    let result = coordinator.run().await;

    if let Err(e) = browser.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }

    let records = result?;
    if !records.is_empty() {
        let total = output::merge_records(Path::new(&records_path), &records)?;
        tracing::info!("Records file now holds {} books", total);
    }
    Ok(records)
}
