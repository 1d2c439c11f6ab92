//! JSON output formatting

use audmage_core::RunReport;
use audmage_meta::TrackId;
use serde::Serialize;
use std::path::PathBuf;

/// Result of a standalone metadata match
#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub files: usize,
    pub matched: usize,
    pub unmatched: Vec<TrackId>,
    pub cache_path: PathBuf,
}

/// Print a run report as JSON
pub fn print_json_report(report: &RunReport) {
    print_json(report, "report");
}

pub fn print_json_summary(summary: &MatchSummary) {
    print_json(summary, "summary");
}

fn print_json<T: Serialize>(value: &T, what: &str) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing {}: {}", what, e),
    }
}
