//! Scan summary
//!
//! Counts what happened to each roster entity during a scan, and prints the
//! result along with the per-section roster statistics.

use crate::store::SectionStats;
use chrono::{DateTime, Duration, Utc};

/// How one dispatched worker ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// The crawl returned on its own
    Completed,

    /// The crawl hit the per-site deadline and was cancelled
    TimedOut,

    /// The site URL was unusable or the crawl task panicked
    Failed,
}

/// Result of one worker, as reported back to the orchestrator
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub name: String,
    pub status: WorkerStatus,
    pub domain_emails: usize,
    pub unsure_emails: usize,
    /// Whether the roster had an entry with this name
    pub matched: bool,
}

/// Summary of a whole scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Entities listed in the roster
    pub total: usize,

    /// Entities handed to a worker
    pub dispatched: usize,

    /// Entities without a site URL
    pub skipped: usize,

    pub completed: usize,
    pub timed_out: usize,
    pub failed: usize,

    /// Entities for which a domain address was found
    pub with_domain: usize,

    /// Entities for which only unsure addresses were found
    pub with_unsure: usize,

    /// Updates that matched no roster entry
    pub unmatched: usize,
}

impl ScanReport {
    pub(crate) fn new(total: usize) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            total,
            dispatched: 0,
            skipped: 0,
            completed: 0,
            timed_out: 0,
            failed: 0,
            with_domain: 0,
            with_unsure: 0,
            unmatched: 0,
        }
    }

    pub(crate) fn record(&mut self, outcome: &WorkerOutcome) {
        match outcome.status {
            WorkerStatus::Completed => self.completed += 1,
            WorkerStatus::TimedOut => self.timed_out += 1,
            WorkerStatus::Failed => self.failed += 1,
        }

        if outcome.domain_emails > 0 {
            self.with_domain += 1;
        } else if outcome.unsure_emails > 0 {
            self.with_unsure += 1;
        }

        if !outcome.matched {
            self.unmatched += 1;
        }
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }

    /// Entities for which nothing was found
    pub fn without_mail(&self) -> usize {
        self.dispatched
            .saturating_sub(self.with_domain + self.with_unsure)
    }
}

/// Prints the scan summary to stdout
pub fn print_report(report: &ScanReport) {
    println!("=== Scan Summary ===\n");

    println!("Overview:");
    println!("  Started: {}", report.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Duration: {}s", report.duration().num_seconds());
    println!("  Entities in roster: {}", report.total);
    println!("  Dispatched: {}", report.dispatched);
    println!("  Skipped (no site): {}", report.skipped);
    println!();

    println!("Workers:");
    println!("  Completed: {}", report.completed);
    println!("  Timed out: {}", report.timed_out);
    println!("  Failed: {}", report.failed);
    if report.unmatched > 0 {
        println!("  Unmatched updates: {}", report.unmatched);
    }
    println!();

    println!("Results:");
    println!("  {}", percentage_line("Domain address", report.with_domain, report.dispatched));
    println!("  {}", percentage_line("Unsure only", report.with_unsure, report.dispatched));
    println!("  {}", percentage_line("Nothing found", report.without_mail(), report.dispatched));
}

/// Prints per-section roster statistics to stdout
pub fn print_section_stats(stats: &[SectionStats]) {
    println!("=== Roster Statistics ===\n");

    let mut entities = 0;
    let mut with_domain = 0;
    let mut unsure_only = 0;

    for section in stats {
        println!(
            "  {}: {} entities, {} with site, {} domain, {} unsure only",
            section.name,
            section.entities,
            section.with_site,
            section.with_domain,
            section.unsure_only
        );
        entities += section.entities;
        with_domain += section.with_domain;
        unsure_only += section.unsure_only;
    }
    println!();

    println!("Totals:");
    println!("  Sections: {}", stats.len());
    println!("  {}", percentage_line("Domain address", with_domain, entities));
    println!("  {}", percentage_line("Unsure only", unsure_only, entities));
}

fn percentage_line(label: &str, count: usize, total: usize) -> String {
    let percentage = if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    };
    format!("{}: {} ({:.1}%)", label, count, percentage)
}
