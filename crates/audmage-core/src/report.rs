//! Run summary returned by the pipeline and printed by the CLI

use crate::error::AudmageError;
use crate::index::IndexSource;
use crate::splitter::SplitSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where in the run a file was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolve,
    Sort,
    Spect,
    Audmage,
    Dataset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipRecord {
    pub path: PathBuf,
    pub stage: Stage,
    pub reason: String,
}

impl SkipRecord {
    pub fn new(path: &Path, stage: Stage, err: &AudmageError) -> Self {
        log::warn!("Skipping {} ({:?}): {}", path.display(), stage, err);
        Self {
            path: path.to_path_buf(),
            stage,
            reason: err.to_string(),
        }
    }
}

/// Outcome counts of the parallel encode stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncodeSummary {
    pub written: usize,
    pub already_present: usize,
    pub failed: usize,
    /// Work items not started because the test limit was reached
    pub cancelled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub collection: PathBuf,
    pub files_found: usize,
    pub labeled: usize,
    pub index_source: IndexSource,
    pub index_entries: usize,
    pub sorted: usize,
    pub encode: EncodeSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitSummary>,
    pub skipped: Vec<SkipRecord>,
}

impl RunReport {
    pub fn skipped_in(&self, stage: Stage) -> usize {
        self.skipped.iter().filter(|s| s.stage == stage).count()
    }
}
