//! Cache artifact and metadata source readers

use crate::format::{CacheRecord, MetadataRow, TrackId, GENRE_COLUMN, SUBSET_COLUMN, TRACK_ID_COLUMN};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub struct CacheReader;

impl CacheReader {
    /// Read every well-formed record of a cache artifact.
    ///
    /// Malformed lines are logged and skipped; blank lines are ignored.
    pub fn read(path: &Path) -> Result<Vec<CacheRecord>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open cache file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line
                .with_context(|| format!("Failed to read line {} of {}", line_no + 1, path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            match CacheRecord::parse_line(&line) {
                Some(record) => records.push(record),
                None => log::warn!(
                    "Ignoring malformed cache line {} in {}: {:?}",
                    line_no + 1,
                    path.display(),
                    line
                ),
            }
        }

        Ok(records)
    }

    /// True when the cache exists and holds at least one byte
    pub fn is_usable(path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }
}

/// Streaming reader over the positional metadata table.
///
/// Rows without a numeric id (the multi-line header of the FMA table) or
/// too short to carry the subset and genre columns are skipped.
pub struct MetadataReader {
    records: csv::StringRecordsIntoIter<File>,
}

impl MetadataReader {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open metadata file: {}", path.display()))?;

        Ok(Self {
            records: reader.into_records(),
        })
    }

    fn to_row(record: &csv::StringRecord) -> Option<MetadataRow> {
        let track_id = TrackId::parse(record.get(TRACK_ID_COLUMN)?)?;
        let subset = record.get(SUBSET_COLUMN)?.trim().to_string();
        let genre = record.get(GENRE_COLUMN)?.to_string();
        Some(MetadataRow {
            track_id,
            subset,
            genre,
        })
    }
}

impl Iterator for MetadataReader {
    type Item = Result<MetadataRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(anyhow::anyhow!("Malformed metadata row: {}", e))),
            };
            if let Some(row) = Self::to_row(&record) {
                return Some(Ok(row));
            }
        }
    }
}
