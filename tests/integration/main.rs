//! Integration tests for Station-Mail
//!
//! These tests use wiremock to stand in for station websites.

mod crawl_tests;
mod scan_tests;

use station_mail::config::{Config, CrawlerConfig, ScannerConfig, UserAgentConfig};

/// Configuration suitable for plain-http mock servers
pub fn test_config() -> Config {
    Config {
        scanner: ScannerConfig {
            max_workers: 2,
            max_parse_time: 20,
            progress: false,
        },
        crawler: CrawlerConfig {
            lifetime: 10,
            request_timeout: 1,
            max_level: 3,
            max_unsure: 5,
            upgrade_to_https: false,
            insecure_fallback: false,
            max_body_size: 64 * 1024,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/bot".to_string(),
        },
    }
}
