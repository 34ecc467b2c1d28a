//! Request pacing
//!
//! Pauses keep the crawl polite:
//! - A fixed delay before each subject navigation, raised to the site's Crawl-delay when
//!   that is longer
//! - A short pause after each "next" click, picked at random from a small set and never
//!   shorter than the Crawl-delay
//! - The Crawl-delay before each book detail page
//!
//! Every pause is taken through `PageDriver::wait` on the page about to make the request.
//! Detail pages are opened by up to `metadata-concurrency` workers, each pausing on its own
//! page, so the Crawl-delay spaces requests per worker rather than per site.

use crate::browser::PageDriver;
use crate::config::CrawlerConfig;
use crate::robots::RobotsGuard;
use rand::seq::IndexedRandom;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Pacing {
    politeness: Duration,
    crawl_delay: Duration,
    jitter: Vec<Duration>,
}

impl Pacing {
    pub fn new(politeness: Duration, jitter: Vec<Duration>) -> Self {
        Self {
            politeness,
            crawl_delay: Duration::ZERO,
            jitter,
        }
    }

    pub fn with_crawl_delay(mut self, crawl_delay: Duration) -> Self {
        self.crawl_delay = crawl_delay;
        self
    }

    /// Pacing from `politeness-delay` and `jitter`, honoring robots.txt Crawl-delay
    pub fn from_config(config: &CrawlerConfig, robots: &RobotsGuard) -> Self {
        let configured = Duration::from_millis(config.politeness_delay);
        Self::new(
            robots.effective_delay(configured),
            config.jitter.iter().copied().map(Duration::from_millis).collect(),
        )
        .with_crawl_delay(robots.crawl_delay().unwrap_or_default())
    }

    /// No pauses at all
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Vec::new())
    }

    pub fn politeness_delay(&self) -> Duration {
        self.politeness
    }

    pub fn crawl_delay(&self) -> Duration {
        self.crawl_delay
    }

    /// One of the configured jitter values, zero when none are set
    pub fn jitter(&self) -> Duration {
        self.jitter
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Pause taken after a "next" click
    pub fn click_pause(&self) -> Duration {
        self.jitter().max(self.crawl_delay)
    }

    pub async fn before_navigation(&self, page: &dyn PageDriver) {
        pause(page, self.politeness, "subject navigation").await;
    }

    pub async fn before_detail(&self, page: &dyn PageDriver) {
        pause(page, self.crawl_delay, "detail page").await;
    }

    pub async fn after_click(&self, page: &dyn PageDriver) {
        pause(page, self.click_pause(), "next page").await;
    }
}

async fn pause(page: &dyn PageDriver, duration: Duration, before: &str) {
    if !duration.is_zero() {
        tracing::debug!("Waiting {:?} before {}", duration, before);
        page.wait(duration).await;
    }
}
