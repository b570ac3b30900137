//! Page parser for extracting links and address-like strings
//!
//! Links come from `<a href>` attributes only. Addresses are matched over the
//! raw markup, so `mailto:` targets and addresses inside attributes or
//! scripts are found too. That also picks up strings such as
//! `logo@2x.png`, which the crawler filters out when it classifies results.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

static MAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("Email regex is hardcoded and valid")
});

/// What one fetched page contributed to the crawl
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Raw hyperlink targets, in document order, duplicates kept
    pub links: Vec<String>,

    /// Address-like matches, lowercased
    pub emails: BTreeSet<String>,
}

/// Parses a page body
///
/// # Example
///
/// ```
/// use station_mail::crawler::parse_page;
///
/// let html = r#"<a href="mailto:Contact@Example.org">Write</a> <a href="/about">About</a>"#;
/// let page = parse_page(html);
/// assert_eq!(page.links, vec!["mailto:Contact@Example.org", "/about"]);
/// assert!(page.emails.contains("contact@example.org"));
/// ```
pub fn parse_page(body: &str) -> ParsedPage {
    ParsedPage {
        links: extract_links(body),
        emails: extract_emails(body),
    }
}

/// Returns the literal `href` value of every `<a>` element
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if !href.is_empty() {
                    links.push(href.to_string());
                }
            }
        }
    }

    links
}

/// Returns every substring matching the address pattern, lowercased
pub fn extract_emails(content: &str) -> BTreeSet<String> {
    MAIL_REGEX
        .find_iter(content)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}
