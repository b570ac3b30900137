//! Scanner module for crawling a whole roster
//!
//! - `ScanOrchestrator`: bounded worker pool with a hard per-site deadline
//! - `ScanReport`: what happened to each dispatched entity

mod orchestrator;
mod report;

pub use orchestrator::ScanOrchestrator;
pub use report::{print_report, print_section_stats, ScanReport, WorkerOutcome, WorkerStatus};
