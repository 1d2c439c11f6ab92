//! Candidate file discovery

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively list files under `root` whose extension is one of
/// `extensions` (case-insensitive), in file-name order per directory.
pub fn collect_audio_files<S: AsRef<str>>(root: &Path, extensions: &[S]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    log::info!("Found {} audio files under {}", files.len(), root.display());
    files
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|want| want.as_ref().eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
