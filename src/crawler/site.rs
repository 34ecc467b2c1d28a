//! The catalog being crawled: origin, markup selectors and robots policy

use crate::browser::PageDriver;
use crate::config::{SelectorConfig, SiteConfig};
use crate::robots::RobotsGuard;
use crate::url::parse_base_url;
use crate::Result;
use url::Url;

#[derive(Debug, Clone)]
pub struct Site {
    base: Url,
    subjects_url: Url,
    selectors: SelectorConfig,
    robots: RobotsGuard,
}

impl Site {
    pub fn new(
        config: &SiteConfig,
        selectors: SelectorConfig,
        robots: RobotsGuard,
    ) -> Result<Self> {
        let base = parse_base_url(&config.base_url)?;
        let subjects_url = base.join(&config.subjects_path)?;
        Ok(Self {
            base,
            subjects_url,
            selectors,
            robots,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Listing page that seeds the subject frontier
    pub fn subjects_url(&self) -> &Url {
        &self.subjects_url
    }

    pub fn selectors(&self) -> &SelectorConfig {
        &self.selectors
    }

    pub fn robots(&self) -> &RobotsGuard {
        &self.robots
    }

    /// Navigates `page` to `url` unless robots.txt disallows it
    pub async fn navigate(&self, page: &mut dyn PageDriver, url: &Url) -> Result<()> {
        self.robots.check(url)?;
        tracing::debug!("Navigating to {}", url);
        page.goto(url).await?;
        Ok(())
    }

    /// Activates the first element matching `selector` unless its link is disallowed
    ///
    /// A control with an `href` is a navigation and goes through the same robots check as
    /// [`Site::navigate`]. Scripted controls without one are clicked as they are.
    pub async fn click(&self, page: &mut dyn PageDriver, selector: &str) -> Result<()> {
        if let Some(target) = self.click_target(page, selector).await? {
            self.robots.check(&target)?;
            tracing::debug!("Following {} to {}", selector, target);
        }
        page.click(selector).await?;
        Ok(())
    }

    /// Where the first match of `selector` links to, resolved against the current page
    async fn click_target(&self, page: &dyn PageDriver, selector: &str) -> Result<Option<Url>> {
        let Some(href) = page.snapshot().await?.first_attribute(selector, "href")? else {
            return Ok(None);
        };
        let from = page.current_url().unwrap_or_else(|| self.base.clone());
        Ok(Some(from.join(&href)?))
    }
}
