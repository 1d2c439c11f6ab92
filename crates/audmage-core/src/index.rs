//! Genre lookup table keyed by track identifier
//!
//! Loaded once per run, before any lookup happens. The fast path reads the
//! flat cache artifact; when the cache is missing or empty the metadata
//! table is scanned for the candidate files and the result is appended to
//! the cache for the next run.

use crate::config::IndexConfig;
use audmage_meta::{CacheReader, CacheRecord, CacheWriter, GenreLabel, MetadataReader, TrackId};
use anyhow::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// How the index was populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexSource {
    Cache,
    Scan,
    /// Neither source was readable; every file goes through its tags
    Empty,
}

#[derive(Debug, Clone)]
pub struct MetadataIndex {
    entries: HashMap<TrackId, GenreLabel>,
    source: IndexSource,
}

/// Result of scanning the metadata table for a set of files
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub index: MetadataIndex,
    /// Candidate identifiers no accepted row matched
    pub unmatched: Vec<TrackId>,
}

impl MetadataIndex {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            source: IndexSource::Empty,
        }
    }

    pub fn from_entries<I>(entries: I, source: IndexSource) -> Self
    where
        I: IntoIterator<Item = (TrackId, GenreLabel)>,
    {
        Self {
            entries: entries.into_iter().collect(),
            source,
        }
    }

    /// Load the index for a run over `candidates`.
    ///
    /// Never fails: unreadable sources are reported and the index falls
    /// back to the next strategy, ending with an empty index.
    pub fn load(config: &IndexConfig, candidates: &[PathBuf]) -> Self {
        if CacheReader::is_usable(&config.cache_path) {
            match Self::from_cache(&config.cache_path) {
                Ok(index) => {
                    log::info!(
                        "Loaded {} genres from cache {}",
                        index.len(),
                        config.cache_path.display()
                    );
                    return index;
                }
                Err(e) => log::warn!("Cache unreadable, scanning metadata instead: {:#}", e),
            }
        }

        let outcome = match Self::scan(&config.metadata_path, candidates, &config.accepted_subsets) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!(
                    "No genre index available ({:#}); falling back to embedded tags for every file",
                    e
                );
                return Self::empty();
            }
        };

        log::info!(
            "Matched {} of {} files against {} ({} unmatched)",
            outcome.index.len(),
            candidates.len(),
            config.metadata_path.display(),
            outcome.unmatched.len()
        );

        if let Err(e) = outcome.index.persist(&config.cache_path) {
            log::warn!("Could not write cache {}: {:#}", config.cache_path.display(), e);
        }

        outcome.index
    }

    /// Bulk load from the cache artifact. Later lines override earlier ones.
    pub fn from_cache(path: &Path) -> Result<Self> {
        let records = CacheReader::read(path)?;
        Ok(Self::from_entries(
            records.into_iter().map(|r| (r.track_id, r.genre)),
            IndexSource::Cache,
        ))
    }

    /// Match candidate files against the metadata table in one pass.
    ///
    /// The pending identifiers live in a hash set, so each row costs one
    /// lookup. A row counts only if its subset is accepted; the first such
    /// row for an identifier wins. Reading stops once nothing is pending.
    pub fn scan<S: AsRef<str>>(
        metadata_path: &Path,
        candidates: &[PathBuf],
        accepted_subsets: &[S],
    ) -> Result<ScanOutcome> {
        let mut pending: HashSet<TrackId> = candidates
            .iter()
            .filter_map(|path| TrackId::from_path(path))
            .collect();

        let mut entries = HashMap::new();

        if !pending.is_empty() {
            for row in MetadataReader::open(metadata_path)? {
                let row = match row {
                    Ok(row) => row,
                    Err(e) => {
                        log::warn!("{:#}", e);
                        continue;
                    }
                };

                if !row.in_subset(accepted_subsets) || !pending.contains(&row.track_id) {
                    continue;
                }

                match GenreLabel::normalize(&row.genre) {
                    Some(genre) => {
                        log::debug!("Genre for {}: {}", row.track_id, genre);
                        entries.insert(row.track_id, genre);
                        pending.remove(&row.track_id);
                    }
                    None => log::debug!("Row for {} has an empty genre", row.track_id),
                }

                if pending.is_empty() {
                    break;
                }
            }
        }

        let mut unmatched: Vec<TrackId> = pending.into_iter().collect();
        unmatched.sort();

        Ok(ScanOutcome {
            index: Self::from_entries(entries, IndexSource::Scan),
            unmatched,
        })
    }

    /// Append every entry to the cache artifact, ordered by identifier
    pub fn persist(&self, cache_path: &Path) -> Result<()> {
        let records = self.records();
        CacheWriter::new().append(cache_path, &records)?;
        if !records.is_empty() {
            log::info!("Appended {} entries to {}", records.len(), cache_path.display());
        }
        Ok(())
    }

    pub fn records(&self) -> Vec<CacheRecord> {
        let mut records: Vec<CacheRecord> = self
            .entries
            .iter()
            .map(|(id, genre)| CacheRecord::new(*id, genre.clone()))
            .collect();
        records.sort_by_key(|r| r.track_id);
        records
    }

    pub fn get(&self, track_id: &TrackId) -> Option<&GenreLabel> {
        self.entries.get(track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> IndexSource {
        self.source
    }
}
