//! Station-Mail main entry point
//!
//! Command-line interface for scanning a station roster for contact addresses.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use station_mail::config::{load_or_default, validate, Config};
use station_mail::scanner::{print_report, print_section_stats};
use station_mail::{RecordStore, ScanOrchestrator};
use tracing_subscriber::EnvFilter;

/// Station-Mail: contact address finder for radio stations
///
/// Crawls the website of every station listed in the roster file, looking
/// for an email address on the station's own domain, and writes what it
/// finds back into the roster.
#[derive(Parser, Debug)]
#[command(name = "station-mail")]
#[command(version = "1.0.0")]
#[command(about = "Contact address finder for a station roster", long_about = None)]
struct Cli {
    /// Path to the `;`-separated roster file
    #[arg(value_name = "ROSTER")]
    roster: PathBuf,

    /// Maximum number of sites crawled at once (overrides the config file)
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and roster and show what would be crawled
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show roster statistics and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(workers) = cli.workers {
        config.scanner.max_workers = workers;
        validate(&config).context("Invalid worker count")?;
    }
    if cli.quiet {
        config.scanner.progress = false;
    }

    tracing::info!("Opening roster: {}", cli.roster.display());
    let store = RecordStore::open(&cli.roster)
        .with_context(|| format!("Failed to open roster {}", cli.roster.display()))?;

    if cli.dry_run {
        handle_dry_run(&config, &store);
    } else if cli.stats {
        print_section_stats(&store.stats());
    } else {
        handle_scan(config, store).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("station_mail=info,warn"),
            1 => EnvFilter::new("station_mail=debug,info"),
            2 => EnvFilter::new("station_mail=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the effective settings and the work list
fn handle_dry_run(config: &Config, store: &RecordStore) {
    println!("=== Station-Mail Dry Run ===\n");

    println!("Scanner Configuration:");
    println!("  Max workers: {}", config.scanner.max_workers);
    println!("  Max parse time: {}s", config.scanner.max_parse_time);

    println!("\nCrawler Configuration:");
    println!("  Lifetime: {}s", config.crawler.lifetime);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Max level: {}", config.crawler.max_level);
    println!("  Max unsure: {}", config.crawler.max_unsure);
    println!("  Upgrade to https: {}", config.crawler.upgrade_to_https);
    println!("  Insecure fallback: {}", config.crawler.insecure_fallback);
    println!("  Max body size: {} bytes", config.crawler.max_body_size);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    let entities = store.list();
    let with_site = entities
        .iter()
        .filter(|e| !e.site_url.trim().is_empty())
        .count();

    println!("\nRoster: {}\n", store.path().display());
    print_section_stats(&store.stats());

    println!("\n✓ Configuration is valid");
    println!("✓ Roster is readable ({} entities)", entities.len());
    println!("✓ Would crawl {} sites", with_site);
}

/// Handles the main scan
async fn handle_scan(config: Config, store: RecordStore) -> anyhow::Result<()> {
    let orchestrator = ScanOrchestrator::with_http(config).context("Failed to build HTTP client")?;

    match orchestrator.run(Arc::new(store)).await {
        Ok(report) => {
            tracing::info!("Scan completed");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scan failed: {}", e);
            Err(e.into())
        }
    }
}
