//! Per-site crawler
//!
//! A `SiteCrawler` explores one website in two phases:
//!
//! 1. **Normal**: the homepage and the pages it links to directly. If any
//!    address on the site's own domain turns up, the crawl stops here.
//! 2. **Desperate**: starting from the links collected during the normal
//!    phase, up to `max-level` further hops. If still no domain address is
//!    found, a few of the other addresses are kept as unsure results.
//!
//! The whole crawl is bounded by a cooperative `lifetime` budget checked
//! before every fetch.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::mail::{classify, is_media_address, MailResult};
use crate::crawler::parser::parse_page;
use crate::state::{CrawlMode, CrawlState};
use crate::url::{extract_domain, resolve_link, site_base_url};
use crate::UrlError;
use std::sync::Arc;
use url::Url;

/// Outcome of one attempt to fetch a frontier URL
#[derive(Debug)]
enum PageOutcome {
    Fetched(String),
    AlreadyVisited,
    Failed(FetchError),
    LifetimeExceeded,
}

/// Crawls one site looking for a contact address
pub struct SiteCrawler {
    fetcher: Arc<dyn PageFetcher>,
    config: CrawlerConfig,
    progress: bool,
    base_url: Url,
    home_domain: String,
    state: CrawlState,
    result: MailResult,
}

impl SiteCrawler {
    /// Creates a crawler for the roster's site value
    ///
    /// # Arguments
    ///
    /// * `site` - The site URL as found in the roster (bare hosts accepted)
    /// * `fetcher` - Source of page bodies
    /// * `config` - Crawl limits
    /// * `progress` - Print a progress line on stdout when the crawl starts
    pub fn new(
        site: &str,
        fetcher: Arc<dyn PageFetcher>,
        config: CrawlerConfig,
        progress: bool,
    ) -> Result<Self, UrlError> {
        let base_url = site_base_url(site, config.upgrade_to_https)?;
        let home_domain = extract_domain(&base_url).ok_or(UrlError::MissingDomain)?;
        let state = CrawlState::new(base_url.clone());

        Ok(Self {
            fetcher,
            config,
            progress,
            base_url,
            home_domain,
            state,
            result: MailResult::default(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn home_domain(&self) -> &str {
        &self.home_domain
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the two-phase crawl and returns the classified addresses
    ///
    /// Never fails: unreachable pages are skipped and an exhausted lifetime
    /// ends the crawl with whatever was found.
    pub async fn find_mail(&mut self) -> MailResult {
        if self.progress {
            println!("Parse : {}", self.base_url);
        }
        tracing::info!(site = %self.base_url, "Searching contact address");

        self.site_loop().await;
        if self.state.is_aborted() {
            return self.result.clone();
        }

        if self.clean_mails(false).has_domain_emails() {
            tracing::debug!(
                site = %self.base_url,
                found = self.result.domain_emails.len(),
                "Domain address found in normal mode"
            );
            return self.result.clone();
        }

        tracing::debug!(
            site = %self.base_url,
            pending = self.state.next_frontier_len(),
            "No domain address, switching to desperate mode"
        );
        self.state.enter_desperate();
        self.site_loop().await;

        if !self.state.is_aborted() {
            self.clean_mails(true);
        }

        tracing::info!(
            site = %self.base_url,
            pages = self.state.visited_count(),
            domain = self.result.domain_emails.len(),
            unsure = self.result.unsure_emails.len(),
            "Crawl finished"
        );
        self.result.clone()
    }

    /// Classifies whatever has been collected so far, keeping unsure addresses
    ///
    /// Used when the crawl future was cancelled before it returned.
    pub fn salvage(&mut self) -> MailResult {
        self.clean_mails(true).clone()
    }

    /// Drains the frontier hop by hop
    ///
    /// Normal mode stops after the homepage's direct links; desperate mode
    /// stops after `max_level` promotions of the next frontier.
    async fn site_loop(&mut self) {
        let mut hops: u32 = 0;

        while let Some(url) = self.state.pop_frontier() {
            match self.fetch_page(&url).await {
                PageOutcome::Fetched(body) => {
                    let page = parse_page(&body);
                    self.state.record_emails(page.emails);
                    for link in &page.links {
                        if let Some(resolved) = resolve_link(link, &self.base_url) {
                            self.state.queue_next(resolved.into_url());
                        }
                    }
                }
                PageOutcome::AlreadyVisited => {
                    tracing::trace!(%url, "Already visited");
                }
                PageOutcome::Failed(error) => {
                    tracing::debug!(%url, %error, "Skipping page");
                }
                PageOutcome::LifetimeExceeded => {
                    tracing::warn!(
                        site = %self.base_url,
                        lifetime = ?self.config.lifetime(),
                        "Crawl lifetime exceeded"
                    );
                    self.state.abort();
                    self.clean_mails(true);
                    return;
                }
            }

            if self.state.frontier_is_empty() {
                if hops >= self.config.max_level {
                    return;
                }
                if self.state.mode() == CrawlMode::Normal && hops > 0 {
                    return;
                }
                self.state.promote_next_frontier();
                hops += 1;
            }
        }
    }

    async fn fetch_page(&mut self, url: &Url) -> PageOutcome {
        if self.state.elapsed() >= self.config.lifetime() {
            return PageOutcome::LifetimeExceeded;
        }

        if !self.state.mark_visited(url) {
            return PageOutcome::AlreadyVisited;
        }

        tracing::debug!(%url, mode = %self.state.mode(), "Fetching");
        match self.fetcher.fetch(url).await {
            Ok(body) => PageOutcome::Fetched(body),
            Err(error) => PageOutcome::Failed(error),
        }
    }

    fn clean_mails(&mut self, save_unsure: bool) -> &MailResult {
        self.state.retain_emails(|email| !is_media_address(email));
        self.result = classify(
            self.state.raw_emails(),
            &self.home_domain,
            save_unsure,
            self.config.max_unsure,
        );
        &self.result
    }
}
