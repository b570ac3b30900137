//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings and timeouts
//! - GET requests to fetch page content
//! - Optional retry without certificate verification
//! - Bounded body reads
//! - Error classification
//!
//! Every error returned here is transient from the crawler's point of view:
//! the URL is skipped and the crawl goes on.

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use thiserror::Error;
use url::Url;

/// Reasons a single page could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected text content from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("HTTP error for {url}: {message}")]
    Other { url: String, message: String },
}

impl FetchError {
    /// Returns true for failures an insecure retry could fix
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

/// Source of page bodies for the crawler
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns its body text
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Timeouts come from the crawler configuration
/// * `user_agent` - The user agent configuration
/// * `accept_invalid_certs` - Disable certificate verification
///
/// # Example
///
/// ```no_run
/// use station_mail::config::{CrawlerConfig, UserAgentConfig};
/// use station_mail::crawler::build_http_client;
///
/// let client = build_http_client(
///     &CrawlerConfig::default(),
///     &UserAgentConfig::default(),
///     false,
/// )
/// .unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
    accept_invalid_certs: bool,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.request_timeout())
        .redirect(Policy::limited(10))
        .danger_accept_invalid_certs(accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// `PageFetcher` backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,

    /// Only present when the insecure fallback is enabled
    insecure_client: Option<Client>,

    /// Body bytes read per page
    max_body_size: usize,
}

impl HttpFetcher {
    /// Creates a fetcher from the crawler and user agent configuration
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(crawler, user_agent, false)?;
        let insecure_client = if crawler.insecure_fallback {
            Some(build_http_client(crawler, user_agent, true)?)
        } else {
            None
        };

        Ok(Self {
            client,
            insecure_client,
            max_body_size: crawler.max_body_size,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a page
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 200, text body | body, cut at `max-body-size` bytes |
    /// | Any other status | `Status` |
    /// | Non-text Content-Type | `ContentMismatch` |
    /// | Timeout | `Timeout` |
    /// | Connection refused / TLS failure | `Connect`, retried once insecurely if enabled |
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        match get_text(&self.client, url, self.max_body_size).await {
            Err(error) if error.is_connect() => match &self.insecure_client {
                Some(insecure) => {
                    tracing::debug!(%url, %error, "Retrying without certificate verification");
                    get_text(insecure, url, self.max_body_size).await
                }
                None => Err(error),
            },
            result => result,
        }
    }
}

async fn get_text(client: &Client, url: &Url, limit: usize) -> Result<String, FetchError> {
    let mut response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if let Some(content_type) = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        if !is_text_content(content_type) {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type: content_type.to_string(),
            });
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| body_error(url, e))? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            tracing::debug!(%url, limit, "Body truncated");
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn body_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Body {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Other {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Returns true for Content-Type values worth scanning for addresses
fn is_text_content(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.starts_with("text/") || content_type.contains("xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(
            &CrawlerConfig::default(),
            &UserAgentConfig::default(),
            false,
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_insecure_client_only_when_enabled() {
        let mut crawler = CrawlerConfig::default();
        let fetcher = HttpFetcher::new(&crawler, &UserAgentConfig::default()).unwrap();
        assert!(fetcher.insecure_client.is_none());

        crawler.insecure_fallback = true;
        let fetcher = HttpFetcher::new(&crawler, &UserAgentConfig::default()).unwrap();
        assert!(fetcher.insecure_client.is_some());
    }

    #[test]
    fn test_body_limit_from_config() {
        let mut crawler = CrawlerConfig::default();
        crawler.max_body_size = 512;
        let fetcher = HttpFetcher::new(&crawler, &UserAgentConfig::default()).unwrap();
        assert_eq!(fetcher.max_body_size, 512);
    }

    #[test]
    fn test_is_text_content() {
        assert!(is_text_content("text/html; charset=utf-8"));
        assert!(is_text_content("TEXT/PLAIN"));
        assert!(is_text_content("application/xhtml+xml"));
        assert!(!is_text_content("image/png"));
        assert!(!is_text_content("application/pdf"));
    }

    #[test]
    fn test_connect_classification() {
        let error = FetchError::Connect {
            url: "https://example.org/".to_string(),
            message: "refused".to_string(),
        };
        assert!(error.is_connect());

        let error = FetchError::Status {
            url: "https://example.org/".to_string(),
            status: 404,
        };
        assert!(!error.is_connect());
        assert_eq!(error.to_string(), "HTTP 404 for https://example.org/");
    }
}
