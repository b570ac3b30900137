//! Station-Mail: contact address discovery for a roster of radio stations
//!
//! This crate crawls each station's website in a bounded, two-phase
//! exploration, classifies the email addresses it finds by confidence, and
//! merges the results into a shared roster file that many concurrent workers
//! update without clobbering each other.

pub mod config;
pub mod crawler;
pub mod scanner;
pub mod state;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for Station-Mail operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Station-Mail operations
pub type Result<T> = std::result::Result<T, ScanError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{MailResult, SiteCrawler};
pub use scanner::{ScanOrchestrator, ScanReport};
pub use state::{CrawlMode, CrawlState};
pub use store::{EntityRecord, RecordStore, Roster};
pub use url::{resolve_link, ResolvedUrl};
