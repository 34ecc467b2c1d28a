//! Scripted in-memory pages for tests
//!
//! A page holds a sequence of documents. Clicking a selector present in the current
//! document advances to the next one, which models a "load more" control without a
//! browser. Routes map URL paths to their document sequences for multi-page tests.
//! Pauses are recorded rather than slept.

use crate::browser::{BrowserContext, BrowserError, BrowserResult, DomSnapshot, PageDriver};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

pub(crate) type Routes = HashMap<String, Vec<String>>;

#[derive(Debug, Default)]
pub(crate) struct ScriptedPage {
    routes: Arc<Routes>,
    states: Vec<String>,
    index: usize,
    url: Option<Url>,
    live: bool,
    closed: bool,
    pub(crate) clicks: usize,
    pub(crate) visited: Vec<Url>,
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedPage {
    /// A page already showing `states[0]`
    pub(crate) fn new(states: Vec<String>) -> Self {
        Self {
            states,
            ..Self::default()
        }
    }

    /// A blank page that loads documents from `routes` on navigation
    pub(crate) fn routed(routes: Arc<Routes>) -> Self {
        Self {
            routes,
            ..Self::default()
        }
    }

    pub(crate) fn live(mut self) -> Self {
        self.live = true;
        self
    }

    /// Every pause requested through `wait`, in order
    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.waits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn current(&self) -> &str {
        self.states.get(self.index).map(String::as_str).unwrap_or("")
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn goto(&mut self, url: &Url) -> BrowserResult<()> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        self.visited.push(url.clone());

        let states = self
            .routes
            .get(url.path())
            .cloned()
            .ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })?;

        self.states = states;
        self.index = 0;
        self.url = Some(url.clone());
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        Ok(self.current().to_string())
    }

    async fn click(&mut self, selector: &str) -> BrowserResult<()> {
        if !DomSnapshot::new(self.current()).exists(selector)? {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.clicks += 1;
        if self.index + 1 < self.states.len() {
            self.index += 1;
        }
        Ok(())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.closed = true;
        Ok(())
    }

    fn current_url(&self) -> Option<Url> {
        self.url.clone()
    }

    fn is_live(&self) -> bool {
        self.live
    }

    /// Records the pause instead of sleeping
    async fn wait(&self, duration: Duration) {
        self.waits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

/// Hands out routed pages and counts them
#[derive(Debug, Default)]
pub(crate) struct ScriptedBrowser {
    routes: Arc<Routes>,
    opened: AtomicUsize,
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedBrowser {
    pub(crate) fn new(routes: Routes) -> Self {
        Self {
            routes: Arc::new(routes),
            ..Self::default()
        }
    }

    pub(crate) fn pages_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Pauses requested by every page this browser handed out
    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.waits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl BrowserContext for ScriptedBrowser {
    async fn new_page(&self) -> BrowserResult<Box<dyn PageDriver>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedPage {
            waits: self.waits.clone(),
            ..ScriptedPage::routed(self.routes.clone())
        }))
    }

    async fn close(&self) -> BrowserResult<()> {
        Ok(())
    }
}
