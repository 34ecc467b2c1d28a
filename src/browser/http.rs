//! Static HTTP page backend
//!
//! This module provides the default page backend:
//! - Building an HTTP client that presents the crawl identity on every request
//! - Fetching documents and keeping the last one as the page's DOM
//! - Following "next" controls through their `href`

use crate::browser::{BrowserContext, BrowserError, BrowserResult, DomSnapshot, PageDriver};
use crate::config::IdentityConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Headers that identify the crawler to the site
///
/// Yields a `From` contact, a bot signature and a purpose statement named after the
/// crawler, followed by any configured extra headers.
///
/// # Example
///
/// ```
/// use shelfmark::browser::identity_headers;
/// use shelfmark::config::IdentityConfig;
///
/// let identity = IdentityConfig {
///     user_agent: "Mozilla/5.0".to_string(),
///     crawler_name: "Shelfmark".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
///     purpose: "Building a book search index".to_string(),
///     extra_headers: Default::default(),
/// };
///
/// let headers = identity_headers(&identity);
/// assert_eq!(headers[1].0, "X-Shelfmark-Bot");
/// ```
pub fn identity_headers(identity: &IdentityConfig) -> Vec<(String, String)> {
    let mut headers = vec![
        ("From".to_string(), identity.contact_email.clone()),
        (
            format!("X-{}-Bot", identity.crawler_name),
            format!(
                "{}/{} (+{}; contact: {})",
                identity.crawler_name,
                identity.crawler_version,
                identity.contact_url,
                identity.contact_email
            ),
        ),
        (
            format!("X-{}-Purpose", identity.crawler_name),
            identity.purpose.clone(),
        ),
    ];

    headers.extend(
        identity
            .extra_headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    headers
}

fn header_map(identity: &IdentityConfig) -> BrowserResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in identity_headers(identity) {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| BrowserError::Header {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(&value).map_err(|e| BrowserError::Header {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Builds an HTTP client carrying the crawl identity
///
/// # Arguments
///
/// * `identity` - The identity configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(BrowserError)` - A header was invalid or the client failed to build
pub fn build_http_client(identity: &IdentityConfig) -> BrowserResult<Client> {
    let client = Client::builder()
        .user_agent(identity.user_agent.as_str())
        .default_headers(header_map(identity)?)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// Session backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct StaticBrowser {
    client: Client,
}

impl StaticBrowser {
    pub fn new(identity: &IdentityConfig) -> BrowserResult<Self> {
        Ok(Self {
            client: build_http_client(identity)?,
        })
    }
}

#[async_trait]
impl BrowserContext for StaticBrowser {
    async fn new_page(&self) -> BrowserResult<Box<dyn PageDriver>> {
        Ok(Box::new(StaticPage::new(self.client.clone())))
    }

    async fn close(&self) -> BrowserResult<()> {
        Ok(())
    }
}

/// A page whose DOM is the last fetched document
#[derive(Debug)]
pub struct StaticPage {
    client: Client,
    url: Option<Url>,
    html: String,
    closed: bool,
}

impl StaticPage {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: None,
            html: String::new(),
            closed: false,
        }
    }
}

#[async_trait]
impl PageDriver for StaticPage {
    async fn goto(&mut self, url: &Url) -> BrowserResult<()> {
        if self.closed {
            return Err(BrowserError::Closed);
        }

        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let final_url = response.url().clone();
        self.html = response.text().await?;
        self.url = Some(final_url);
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        Ok(self.html.clone())
    }

    async fn click(&mut self, selector: &str) -> BrowserResult<()> {
        let snapshot = DomSnapshot::new(self.html.as_str());
        if !snapshot.exists(selector)? {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }

        let href = snapshot.first_attribute(selector, "href")?.ok_or_else(|| {
            BrowserError::Unsupported(format!(
                "{} has no href; scripted controls need the chrome engine",
                selector
            ))
        })?;

        let base = self.url.clone().ok_or_else(|| {
            BrowserError::Unsupported("click before any navigation".to_string())
        })?;
        let target = base.join(&href).map_err(|e| BrowserError::Navigation {
            url: href.clone(),
            reason: e.to_string(),
        })?;

        self.goto(&target).await
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.closed = true;
        self.html.clear();
        Ok(())
    }

    fn current_url(&self) -> Option<Url> {
        self.url.clone()
    }
}
