//! Scan orchestrator - runs one crawl per roster entity
//!
//! At most `max-workers` crawls are in flight at once. Each crawl runs in
//! its own task under the `max-parse-time` deadline; when the deadline
//! fires the crawl future is dropped and whatever it had collected is
//! salvaged. Every dispatched entity then gets exactly one store update,
//! issued after its crawl has fully stopped.

use crate::config::Config;
use crate::crawler::{HttpFetcher, MailResult, PageFetcher, SiteCrawler};
use crate::scanner::report::{ScanReport, WorkerOutcome, WorkerStatus};
use crate::store::{EntityRecord, RecordStore};
use crate::ScanError;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::timeout;

/// Drives a whole roster scan
pub struct ScanOrchestrator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
}

impl ScanOrchestrator {
    /// Creates an orchestrator sharing `fetcher` between all crawls
    pub fn new(config: Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
        }
    }

    /// Creates an orchestrator with an HTTP fetcher built from `config`
    pub fn with_http(config: Config) -> Result<Self, ScanError> {
        let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawls every entity of `store` and records the results
    ///
    /// Individual site failures and timeouts never abort the scan; only a
    /// store error does.
    pub async fn run(&self, store: Arc<RecordStore>) -> Result<ScanReport, ScanError> {
        let entities = store.list();
        let max_workers = self.config.scanner.max_workers.max(1);
        let mut report = ScanReport::new(entities.len());
        let mut workers = JoinSet::new();

        tracing::info!(
            entities = entities.len(),
            max_workers,
            "Starting scan"
        );

        for entity in entities {
            if entity.site_url.trim().is_empty() {
                tracing::debug!(entity = %entity.name, "No site, skipping");
                report.skipped += 1;
                continue;
            }

            while workers.len() >= max_workers {
                if let Some(joined) = workers.join_next().await {
                    report.record(&joined??);
                }
            }

            report.dispatched += 1;
            workers.spawn(run_worker(
                entity,
                Arc::clone(&self.config),
                Arc::clone(&self.fetcher),
                Arc::clone(&store),
            ));
        }

        while let Some(joined) = workers.join_next().await {
            report.record(&joined??);
        }

        report.finish();
        tracing::info!(
            dispatched = report.dispatched,
            timed_out = report.timed_out,
            failed = report.failed,
            with_domain = report.with_domain,
            "Scan complete"
        );

        Ok(report)
    }
}

/// Crawls one entity and merges the result into the store
async fn run_worker(
    entity: EntityRecord,
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<RecordStore>,
) -> Result<WorkerOutcome, ScanError> {
    let crawl = tokio::spawn(crawl_site(entity.site_url.clone(), config, fetcher));

    let (result, status) = match crawl.await {
        Ok(crawled) => crawled,
        Err(error) => {
            tracing::error!(entity = %entity.name, %error, "Crawl task failed");
            (MailResult::default(), WorkerStatus::Failed)
        }
    };

    let outcome = WorkerOutcome {
        name: entity.name.clone(),
        status,
        domain_emails: result.domain_emails.len(),
        unsure_emails: result.unsure_emails.len(),
        matched: false,
    };

    let matched = tokio::task::spawn_blocking(move || {
        store.update_entity(&entity.name, &result.domain_emails, &result.unsure_emails)
    })
    .await??;

    Ok(WorkerOutcome { matched, ..outcome })
}

/// Runs the crawl under the hard deadline
async fn crawl_site(
    site: String,
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
) -> (MailResult, WorkerStatus) {
    let mut crawler = match SiteCrawler::new(
        &site,
        fetcher,
        config.crawler.clone(),
        config.scanner.progress,
    ) {
        Ok(crawler) => crawler,
        Err(error) => {
            tracing::warn!(%site, %error, "Unusable site URL");
            return (MailResult::default(), WorkerStatus::Failed);
        }
    };

    let deadline = config.scanner.max_parse_time();
    let finished = timeout(deadline, crawler.find_mail()).await;

    match finished {
        Ok(result) => (result, WorkerStatus::Completed),
        Err(_) => {
            tracing::warn!(%site, ?deadline, "Crawl deadline reached");
            (crawler.salvage(), WorkerStatus::TimedOut)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use url::Url;

    /// Serves pages from memory and tracks how many fetches overlap
    #[derive(Default)]
    struct MapFetcher {
        pages: HashMap<String, String>,
        hang_on: Option<String>,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MapFetcher {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if self.hang_on.as_deref() == Some(url.as_str()) {
                std::future::pending::<()>().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.scanner.progress = false;
        config
    }

    fn roster_file(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stations.csv");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_scan_updates_store() {
        let (_dir, path) = roster_file(
            "Ain;;;\n\
             Radio A;https://a.example.org;;\n\
             Radio B;https://b.example.org;;\n\
             Radio C;;old@c.example.org;\n",
        );
        let fetcher = MapFetcher::default()
            .page(
                "https://a.example.org/",
                r#"<a href="mailto:contact@a.example.org">Contact</a>"#,
            )
            .page(
                "https://b.example.org/",
                r#"<a href="/team">Team</a>"#,
            )
            .page("https://b.example.org/team", "webmaster@thirdparty.com");
        let orchestrator = ScanOrchestrator::new(quiet_config(), Arc::new(fetcher));
        let store = Arc::new(RecordStore::open(&path).unwrap());

        let report = orchestrator.run(Arc::clone(&store)).await.unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.dispatched, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.completed, 2);
        assert_eq!(report.with_domain, 1);
        assert_eq!(report.with_unsure, 1);

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Ain;;;\n\
             Radio A;https://a.example.org;contact@a.example.org;\n\
             Radio B;https://b.example.org;;webmaster@thirdparty.com\n\
             Radio C;;old@c.example.org;\n"
        );
    }

    #[tokio::test]
    async fn test_worker_bound_respected() {
        let mut roster = String::from("Ain;;;\n");
        let mut fetcher = MapFetcher {
            delay: Some(Duration::from_millis(50)),
            ..MapFetcher::default()
        };
        for i in 0..8 {
            roster.push_str(&format!("Radio {i};https://r{i}.example.org;;\n"));
            fetcher = fetcher.page(
                &format!("https://r{i}.example.org/"),
                &format!("info@r{i}.example.org"),
            );
        }
        let (_dir, path) = roster_file(&roster);

        let mut config = quiet_config();
        config.scanner.max_workers = 3;
        let fetcher = Arc::new(fetcher);
        let orchestrator = ScanOrchestrator::new(config, fetcher.clone());

        let report = orchestrator
            .run(Arc::new(RecordStore::open(&path).unwrap()))
            .await
            .unwrap();

        assert_eq!(report.with_domain, 8);
        assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_hung_site_times_out_and_scan_continues() {
        let (_dir, path) = roster_file(
            "Ain;;;\n\
             Radio Slow;https://slow.example.org;;\n\
             Radio A;https://a.example.org;;\n",
        );
        let fetcher = MapFetcher {
            hang_on: Some("https://slow.example.org/team".to_string()),
            ..MapFetcher::default()
        }
        .page(
            "https://slow.example.org/",
            r#"desk@elsewhere.net <a href="/team">Team</a>"#,
        )
        .page("https://a.example.org/", "contact@a.example.org");

        let mut config = quiet_config();
        config.scanner.max_parse_time = 1;
        config.crawler.lifetime = 60;
        let orchestrator = ScanOrchestrator::new(config, Arc::new(fetcher));

        let report = orchestrator
            .run(Arc::new(RecordStore::open(&path).unwrap()))
            .await
            .unwrap();

        assert_eq!(report.timed_out, 1);
        assert_eq!(report.completed, 1);

        let records = RecordStore::open(&path).unwrap().list();
        let slow = records.iter().find(|e| e.name == "Radio Slow").unwrap();
        assert!(slow.unsure_emails.contains("desk@elsewhere.net"));
        let a = records.iter().find(|e| e.name == "Radio A").unwrap();
        assert!(a.domain_emails.contains("contact@a.example.org"));
    }

    #[tokio::test]
    async fn test_invalid_site_still_updates() {
        let (_dir, path) = roster_file(
            "Ain;;;\n\
             Radio Bad;http://;;\n",
        );
        let orchestrator = ScanOrchestrator::new(quiet_config(), Arc::new(MapFetcher::default()));

        let report = orchestrator
            .run(Arc::new(RecordStore::open(&path).unwrap()))
            .await
            .unwrap();

        assert_eq!(report.dispatched, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.unmatched, 0);
    }
}
