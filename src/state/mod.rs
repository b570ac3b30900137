//! State module for tracking a site crawl
//!
//! # Components
//!
//! - `CrawlMode`: Normal (homepage and its direct links) or Desperate (several hops deep)
//! - `CrawlState`: visited set, current and next frontier, raw address matches

mod crawl_state;

pub use crawl_state::{CrawlMode, CrawlState};
