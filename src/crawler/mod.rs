//! Crawler module for finding contact addresses on a site
//!
//! This module contains the per-site crawling logic, including:
//! - HTTP fetching behind the `PageFetcher` trait
//! - Link and address extraction from page markup
//! - Classification of addresses by confidence
//! - The two-phase (normal, then desperate) site exploration

mod fetcher;
mod mail;
mod parser;
mod site;

pub use fetcher::{build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use mail::{classify, is_media_address, mail_domain, MailResult};
pub use parser::{extract_emails, extract_links, parse_page, ParsedPage};
pub use site::SiteCrawler;

use crate::config::Config;
use crate::ScanError;
use std::sync::Arc;

/// Crawls a single site with an HTTP fetcher built from `config`
///
/// This is the one-shot entry point; the scanner builds one fetcher and
/// shares it between all of its crawls instead.
///
/// # Example
///
/// ```no_run
/// use station_mail::config::Config;
/// use station_mail::crawler::find_mail;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let result = find_mail("https://radio.example.org", &Config::default()).await?;
/// println!("{:?}", result.domain_emails);
/// # Ok(())
/// # }
/// ```
pub async fn find_mail(site: &str, config: &Config) -> Result<MailResult, ScanError> {
    let fetcher = Arc::new(HttpFetcher::new(&config.crawler, &config.user_agent)?);
    let mut crawler = SiteCrawler::new(
        site,
        fetcher,
        config.crawler.clone(),
        config.scanner.progress,
    )?;
    Ok(crawler.find_mail().await)
}
