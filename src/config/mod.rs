//! Configuration module for Station-Mail
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use station_mail::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("station-mail.toml")).unwrap();
//! println!("Crawler lifetime: {}s", config.crawler.lifetime);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, ScannerConfig, UserAgentConfig};

pub use parser::{load_config, load_or_default, parse_config};
pub use validation::validate;
