//! Per-site crawl state
//!
//! A `CrawlState` is owned by exactly one crawl and dropped when it returns.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::time::{Duration, Instant};
use url::Url;

/// Exploration strategy of a site crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlMode {
    /// Homepage plus the pages it links to directly
    Normal,

    /// Several link hops deep, used only when Normal found no domain address
    Desperate,
}

impl CrawlMode {
    /// Returns true if the crawl explores beyond the homepage's direct links
    pub fn is_desperate(&self) -> bool {
        matches!(self, Self::Desperate)
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Desperate => write!(f, "desperate"),
        }
    }
}

/// Frontier, visited set and raw findings of one crawl
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// URLs already fetched (or attempted)
    visited: HashSet<Url>,

    /// URLs pending fetch in the current hop
    frontier: BTreeSet<Url>,

    /// URLs collected while draining `frontier`
    next_frontier: BTreeSet<Url>,

    /// Every address-like match seen so far, lowercased
    raw_emails: BTreeSet<String>,

    /// Current exploration mode
    mode: CrawlMode,

    /// When the crawl started
    started_at: Instant,

    /// Set once the lifetime budget has been exceeded
    aborted: bool,
}

impl CrawlState {
    /// Creates the initial state: only the homepage is pending
    pub fn new(homepage: Url) -> Self {
        Self {
            visited: HashSet::new(),
            frontier: BTreeSet::from([homepage]),
            next_frontier: BTreeSet::new(),
            raw_emails: BTreeSet::new(),
            mode: CrawlMode::Normal,
            started_at: Instant::now(),
            aborted: false,
        }
    }

    pub fn mode(&self) -> CrawlMode {
        self.mode
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn raw_emails(&self) -> &BTreeSet<String> {
        &self.raw_emails
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn frontier_is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    pub fn next_frontier_len(&self) -> usize {
        self.next_frontier.len()
    }

    /// Removes and returns one pending URL of the current hop
    pub fn pop_frontier(&mut self) -> Option<Url> {
        self.frontier.pop_first()
    }

    /// Records a fetch attempt; returns false if the URL was already visited
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.clone())
    }

    /// Queues a URL for the next hop unless it was already visited
    pub fn queue_next(&mut self, url: Url) -> bool {
        if self.visited.contains(&url) {
            return false;
        }
        self.next_frontier.insert(url)
    }

    /// Makes the collected next hop the current frontier
    pub fn promote_next_frontier(&mut self) {
        self.frontier = std::mem::take(&mut self.next_frontier);
    }

    pub fn record_emails<I>(&mut self, emails: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.raw_emails.extend(emails);
    }

    /// Drops raw matches rejected by `keep`
    pub fn retain_emails<F>(&mut self, keep: F)
    where
        F: FnMut(&String) -> bool,
    {
        self.raw_emails.retain(keep);
    }

    /// Switches to desperate mode, seeding the frontier from the leftover next hop
    pub fn enter_desperate(&mut self) {
        self.mode = CrawlMode::Desperate;
        self.promote_next_frontier();
    }

    /// Stops the crawl: nothing is pending anymore
    pub fn abort(&mut self) {
        self.aborted = true;
        self.frontier.clear();
        self.next_frontier.clear();
    }
}
