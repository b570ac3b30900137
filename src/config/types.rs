use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Station-Mail
///
/// Every section and key has a default, so an empty (or absent) file is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Orchestrator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScannerConfig {
    /// Maximum number of crawl tasks in flight at once
    pub max_workers: usize,

    /// Hard deadline for a single crawl task (seconds)
    pub max_parse_time: u64,

    /// Print one line per visited site on stdout
    pub progress: bool,
}

impl ScannerConfig {
    pub fn max_parse_time(&self) -> Duration {
        Duration::from_secs(self.max_parse_time)
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            max_parse_time: 7 * 60,
            progress: true,
        }
    }
}

/// Per-site crawler configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Cooperative wall-clock budget for one site (seconds)
    pub lifetime: u64,

    /// Timeout applied to each HTTP request (seconds)
    pub request_timeout: u64,

    /// Maximum number of link hops explored in desperate mode
    pub max_level: u32,

    /// Maximum number of unsure addresses kept for a site
    pub max_unsure: usize,

    /// Force the https scheme on the site's base URL
    pub upgrade_to_https: bool,

    /// Retry connection/TLS failures once without certificate verification
    pub insecure_fallback: bool,

    /// Bytes of a page body kept for scanning; the rest is not downloaded
    pub max_body_size: usize,
}

impl CrawlerConfig {
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            lifetime: 30,
            request_timeout: 5,
            max_level: 3,
            max_unsure: 5,
            upgrade_to_https: true,
            insecure_fallback: false,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler (optional)
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        if self.contact_url.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, self.contact_url
            )
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "station-mail".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: String::new(),
        }
    }
}
