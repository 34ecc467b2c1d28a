//! Robots.txt handling module
//!
//! The catalog's robots.txt is fetched once per session. Every navigation the crawler makes
//! goes through a `RobotsGuard`, and the site's Crawl-delay raises the politeness delay
//! when it is longer than the configured one.

mod parser;

pub use parser::RobotsPolicy;

use crate::ShelfError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Fetches robots.txt for the origin of `base`
///
/// Any failure (transport error, non-success status, unreadable body) yields an allow-all
/// policy; a warning is logged unless the file is simply absent.
pub async fn fetch_robots(client: &Client, base: &Url) -> RobotsPolicy {
    let robots_url = match base.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", base, e);
            return RobotsPolicy::allow_all();
        }
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", robots_url, e);
            return RobotsPolicy::allow_all();
        }
    };

    match response.status() {
        status if status.is_success() => match response.text().await {
            Ok(body) => {
                tracing::info!("Loaded {} ({} bytes)", robots_url, body.len());
                RobotsPolicy::from_content(&body)
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", robots_url, e);
                RobotsPolicy::allow_all()
            }
        },
        StatusCode::NOT_FOUND => {
            tracing::debug!("No robots.txt at {}", robots_url);
            RobotsPolicy::allow_all()
        }
        status => {
            tracing::warn!("Unexpected status {} for {}", status, robots_url);
            RobotsPolicy::allow_all()
        }
    }
}

/// Navigation gate bound to one crawler identity
#[derive(Debug, Clone)]
pub struct RobotsGuard {
    policy: RobotsPolicy,
    agent: String,
}

impl RobotsGuard {
    pub fn new(policy: RobotsPolicy, agent: impl Into<String>) -> Self {
        Self {
            policy,
            agent: agent.into(),
        }
    }

    /// A guard that never refuses
    pub fn allow_all() -> Self {
        Self::new(RobotsPolicy::allow_all(), "*")
    }

    pub fn is_allowed(&self, url: &Url) -> bool {
        self.policy.is_allowed(url, &self.agent)
    }

    /// Fails with `ShelfError::RobotsDenied` when `url` is disallowed
    pub fn check(&self, url: &Url) -> Result<(), ShelfError> {
        if self.is_allowed(url) {
            Ok(())
        } else {
            Err(ShelfError::RobotsDenied {
                url: url.to_string(),
            })
        }
    }

    pub fn crawl_delay(&self) -> Option<Duration> {
        self.policy.crawl_delay(&self.agent)
    }

    /// The longer of `configured` and the site's Crawl-delay
    pub fn effective_delay(&self, configured: Duration) -> Duration {
        match self.crawl_delay() {
            Some(delay) if delay > configured => {
                tracing::info!(
                    "robots.txt Crawl-delay of {:?} overrides configured {:?}",
                    delay,
                    configured
                );
                delay
            }
            _ => configured,
        }
    }
}
