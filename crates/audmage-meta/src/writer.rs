//! Cache artifact writer

use crate::format::CacheRecord;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct CacheWriter {}

impl CacheWriter {
    pub fn new() -> Self {
        Self {}
    }

    /// Append records to the cache artifact, creating it if needed.
    ///
    /// The artifact has no header and no escaping; labels are already
    /// normalized so each line splits into exactly two tokens.
    pub fn append(&self, path: &Path, records: &[CacheRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open cache file: {}", path.display()))?;

        let mut writer = BufWriter::new(file);
        self.write_records(&mut writer, records)?;
        writer.flush()?;

        Ok(())
    }

    fn write_records(&self, writer: &mut BufWriter<File>, records: &[CacheRecord]) -> Result<()> {
        for record in records {
            writeln!(writer, "{}", record.to_line())?;
        }
        Ok(())
    }
}

impl Default for CacheWriter {
    fn default() -> Self {
        Self::new()
    }
}
