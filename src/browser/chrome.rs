//! Chrome DevTools page backend
//!
//! Launches a local Chrome through chromiumoxide. Every page gets the configured user agent
//! and identity headers before its first navigation.

use crate::browser::http::identity_headers;
use crate::browser::{BrowserContext, BrowserError, BrowserResult, PageDriver};
use crate::config::IdentityConfig;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

fn driver_error(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Driver(e.to_string())
}

/// A launched Chrome process
pub struct ChromeBrowser {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    user_agent: String,
    headers: serde_json::Value,
}

impl ChromeBrowser {
    /// Launches Chrome, visible when `headless` is false
    pub async fn launch(identity: &IdentityConfig, headless: bool) -> BrowserResult<Self> {
        tracing::info!("Launching Chrome (headless={})", headless);

        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        let config = builder.build().map_err(driver_error)?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(driver_error)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let headers = identity_headers(identity)
            .into_iter()
            .map(|(name, value)| (name, serde_json::Value::String(value)))
            .collect::<serde_json::Map<_, _>>();

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            user_agent: identity.user_agent.clone(),
            headers: serde_json::Value::Object(headers),
        })
    }
}

#[async_trait]
impl BrowserContext for ChromeBrowser {
    async fn new_page(&self) -> BrowserResult<Box<dyn PageDriver>> {
        let page = {
            let browser = self.browser.lock().await;
            browser.new_page("about:blank").await.map_err(driver_error)?
        };

        page.execute(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .map_err(driver_error)?;
        page.execute(SetExtraHttpHeadersParams::new(Headers::new(
            self.headers.clone(),
        )))
        .await
        .map_err(driver_error)?;

        Ok(Box::new(ChromePage {
            page: Some(page),
            url: None,
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(driver_error)?;
        self.handler.abort();
        tracing::info!("Chrome closed");
        Ok(())
    }
}

/// One Chrome tab
pub struct ChromePage {
    page: Option<Page>,
    url: Option<Url>,
}

impl ChromePage {
    fn page(&self) -> BrowserResult<&Page> {
        self.page.as_ref().ok_or(BrowserError::Closed)
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn goto(&mut self, url: &Url) -> BrowserResult<()> {
        let page = self.page()?;
        page.goto(url.as_str())
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        page.wait_for_navigation().await.map_err(driver_error)?;
        self.url = Some(url.clone());
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        self.page()?.content().await.map_err(driver_error)
    }

    async fn click(&mut self, selector: &str) -> BrowserResult<()> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(driver_error)?;
        Ok(())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        if let Some(page) = self.page.take() {
            page.close().await.map_err(driver_error)?;
        }
        Ok(())
    }

    fn current_url(&self) -> Option<Url> {
        self.url.clone()
    }

    fn is_live(&self) -> bool {
        true
    }
}
