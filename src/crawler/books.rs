//! Paginated book link discovery

use crate::browser::PageDriver;
use crate::crawler::pacing::Pacing;
use crate::crawler::subjects::{display_url, SubjectLinkCollector};
use crate::crawler::Site;
use crate::state::{BookRef, CrawlState};
use crate::url::qualify_book_link;
use crate::Result;
use std::sync::Arc;
use url::Url;

/// What one subject page contributed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookHarvest {
    /// Books admitted by this call
    pub newly_admitted: usize,
    /// How many times the rendered anchors were scanned
    pub scans: usize,
    /// The whole book frontier after this call
    pub books: Vec<BookRef>,
}

/// Paginates subject pages, harvesting book detail links into the book frontier
#[derive(Clone)]
pub struct BookLinkCollector {
    state: Arc<CrawlState>,
    site: Arc<Site>,
    subjects: SubjectLinkCollector,
    pacing: Pacing,
}

impl BookLinkCollector {
    pub fn new(state: Arc<CrawlState>, site: Arc<Site>, pacing: Pacing) -> Self {
        let subjects = SubjectLinkCollector::new(state.clone(), site.clone());
        Self {
            state,
            site,
            subjects,
            pacing,
        }
    }

    /// Harvests book links from `page`, clicking "next" at most `max_steps` times
    ///
    /// Anchors are re-scanned from the start after every click; dedup makes the rescans
    /// harmless. Scanning stops when the "next" control is missing or disabled, the step
    /// budget is spent, or the book cap is reached.
    pub async fn collect(
        &self,
        page: &mut dyn PageDriver,
        goto: Option<&Url>,
        max_steps: usize,
    ) -> Result<BookHarvest> {
        if self.state.book_backlog_full() {
            tracing::info!("Book link limit reached");
            return Ok(BookHarvest {
                books: self.state.books().books,
                ..BookHarvest::default()
            });
        }

        self.pacing.before_navigation(page).await;

        if let Some(url) = goto {
            self.site.navigate(page, url).await?;
        }

        // Subject pages link to related subjects too
        if let Err(e) = self.subjects.collect(page, None).await {
            tracing::warn!("Subject scan on {} failed: {}", display_url(page), e);
        }

        let selectors = self.site.selectors();
        let mut steps = 0;
        let mut scans = 0;
        let mut newly_admitted = 0;

        loop {
            scans += 1;
            let anchors = page.evaluate_all(&selectors.book_links).await?;
            for anchor in &anchors {
                let Some(link) = anchor
                    .attr("href")
                    .and_then(|href| qualify_book_link(href, self.site.base()))
                else {
                    continue;
                };
                if self.state.admit_book(BookRef::new(&link)).is_admitted() {
                    newly_admitted += 1;
                }
            }

            if self.next_disabled(page).await
                || steps >= max_steps
                || self.state.book_cap_reached()
            {
                tracing::debug!("Pagination stopped after {} scans", scans);
                break;
            }

            if let Err(e) = self.site.click(page, &selectors.next_button).await {
                tracing::warn!("Failed to trigger next on {}: {}", display_url(page), e);
                break;
            }
            self.pacing.after_click(page).await;
            steps += 1;
        }

        self.state.persist_books()?;

        if newly_admitted > 0 {
            tracing::info!("New book links added: {}", newly_admitted);
        } else {
            tracing::info!("No book links added");
        }

        Ok(BookHarvest {
            newly_admitted,
            scans,
            books: self.state.books().books,
        })
    }

    /// Whether the "next" control is absent or flagged disabled
    async fn next_disabled(&self, page: &dyn PageDriver) -> bool {
        let selectors = self.site.selectors();
        let Ok(controls) = page.evaluate_all(&selectors.next_button).await else {
            return true;
        };
        match controls.first() {
            Some(control) => control
                .attr(&selectors.next_disabled_attribute)
                .map(|value| value.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            None => true,
        }
    }
}
