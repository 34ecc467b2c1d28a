//! Subject link discovery

use crate::browser::PageDriver;
use crate::crawler::Site;
use crate::state::{Admission, CrawlState, Subject};
use crate::url::normalize_subject_link;
use crate::Result;
use std::sync::Arc;
use url::Url;

/// Harvests subject links from whatever page it is given into the open frontier
#[derive(Clone)]
pub struct SubjectLinkCollector {
    state: Arc<CrawlState>,
    site: Arc<Site>,
}

impl SubjectLinkCollector {
    pub fn new(state: Arc<CrawlState>, site: Arc<Site>) -> Self {
        Self { state, site }
    }

    /// Scans `page` (after navigating to `goto` if given) and admits new subjects
    ///
    /// Returns how many subjects were admitted. When the frontier is already full the page
    /// is neither visited nor scanned.
    pub async fn collect(&self, page: &mut dyn PageDriver, goto: Option<&Url>) -> Result<usize> {
        if self.state.subject_limit_reached() {
            tracing::info!("Subject limit reached");
            return Ok(0);
        }

        if let Some(url) = goto {
            self.site.navigate(page, url).await?;
        }

        let anchors = page
            .evaluate_all(&self.site.selectors().subject_links)
            .await?;

        let mut admitted = 0;
        for anchor in &anchors {
            let Some(href) = anchor.attr("href") else {
                continue;
            };
            let Some(link) = normalize_subject_link(&anchor.text, href, self.site.base()) else {
                tracing::trace!("Ignoring non-subject link {}", href);
                continue;
            };

            match self.state.admit_subject(Subject::new(anchor.text.as_str(), &link)) {
                Admission::Admitted => admitted += 1,
                Admission::Blocked => tracing::debug!("Skipping blocked subject {}", link),
                Admission::Duplicate | Admission::LimitReached => {}
            }
        }

        self.state.persist_subjects()?;

        if admitted > 0 {
            tracing::info!("New subjects added: {}", admitted);
        } else {
            tracing::debug!("No new subjects on {}", display_url(page));
        }
        Ok(admitted)
    }
}

pub(crate) fn display_url(page: &dyn PageDriver) -> String {
    page.current_url()
        .map(|url| url.to_string())
        .unwrap_or_else(|| "current page".to_string())
}
