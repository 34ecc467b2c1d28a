//! Page automation layer
//!
//! The crawler never talks to a browser directly. It drives pages through two traits:
//!
//! - `BrowserContext`: a shared session that hands out pages carrying the crawl identity
//! - `PageDriver`: one tab, able to navigate, expose its DOM and click controls
//!
//! Two backends ship with the crate. `StaticBrowser` fetches pages with reqwest and follows
//! "next" controls through their `href`. `ChromeBrowser` (feature `browser`) drives a real
//! Chrome over the DevTools protocol for catalogs that paginate with scripts.

mod http;
mod snapshot;

#[cfg(feature = "browser")]
mod chrome;

#[cfg(test)]
pub(crate) mod scripted;

pub use http::{build_http_client, identity_headers, StaticBrowser, StaticPage};
pub use snapshot::{DomSnapshot, ElementSnapshot};

#[cfg(feature = "browser")]
pub use chrome::{ChromeBrowser, ChromePage};

use crate::config::{engine_warnings, Config, Engine};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

/// Interval between DOM polls while waiting for an element on a live page
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised by page automation
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Invalid CSS selector: {0}")]
    Selector(String),

    #[error("No element matches {0}")]
    ElementNotFound(String),

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    #[error("Invalid identity header {name}: {reason}")]
    Header { name: String, reason: String },

    #[error("Browser driver error: {0}")]
    Driver(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Page is closed")]
    Closed,
}

/// Result type for page automation
pub type BrowserResult<T> = Result<T, BrowserError>;

/// One browser tab
///
/// Backends implement navigation, markup access and clicking. The DOM queries are
/// provided on top of `content` and re-read the page until their timeout runs out when the
/// backend is live.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates to `url` and waits for the document to load
    async fn goto(&mut self, url: &Url) -> BrowserResult<()>;

    /// Serialized markup of the current document
    async fn content(&self) -> BrowserResult<String>;

    /// Activates the first element matching `selector`
    async fn click(&mut self, selector: &str) -> BrowserResult<()>;

    /// Releases the tab; further calls fail with `BrowserError::Closed`
    async fn close(&mut self) -> BrowserResult<()>;

    /// URL of the current document
    fn current_url(&self) -> Option<Url>;

    /// Whether the DOM can change without a navigation (scripts running)
    fn is_live(&self) -> bool {
        false
    }

    async fn snapshot(&self) -> BrowserResult<DomSnapshot> {
        Ok(DomSnapshot::new(self.content().await?))
    }

    /// Text of the first match, waiting up to `timeout` for it to appear
    async fn read_text(&self, selector: &str, timeout: Duration) -> BrowserResult<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.snapshot().await?.first_text(selector)?;
            if found.is_some() || !self.is_live() || Instant::now() >= deadline {
                return Ok(found);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Attribute of the first match, waiting up to `timeout` for it to appear
    async fn read_attribute(
        &self,
        selector: &str,
        name: &str,
        timeout: Duration,
    ) -> BrowserResult<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.snapshot().await?.first_attribute(selector, name)?;
            if found.is_some() || !self.is_live() || Instant::now() >= deadline {
                return Ok(found);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Every element currently matching `selector`
    async fn evaluate_all(&self, selector: &str) -> BrowserResult<Vec<ElementSnapshot>> {
        self.snapshot().await?.select_all(selector)
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A browser session shared by every worker
#[async_trait]
pub trait BrowserContext: Send + Sync {
    /// Opens a new tab configured with the crawl identity
    async fn new_page(&self) -> BrowserResult<Box<dyn PageDriver>>;

    /// Shuts the session down
    async fn close(&self) -> BrowserResult<()>;
}

/// Starts the backend selected by `crawler.engine`
pub async fn launch(config: &Config) -> BrowserResult<Arc<dyn BrowserContext>> {
    for warning in engine_warnings(config) {
        tracing::warn!("{}", warning);
    }
    match config.crawler.engine {
        Engine::Static => {
            tracing::info!("Using static HTTP page backend");
            Ok(Arc::new(StaticBrowser::new(&config.identity)?))
        }
        #[cfg(feature = "browser")]
        Engine::Chrome => {
            let browser = ChromeBrowser::launch(&config.identity, config.crawler.headless).await?;
            Ok(Arc::new(browser))
        }
        #[cfg(not(feature = "browser"))]
        Engine::Chrome => Err(BrowserError::Unsupported(
            "engine \"chrome\" requires building with --features browser".to_string(),
        )),
    }
}
