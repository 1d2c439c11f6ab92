//! Genre lookup record structures
//!
//! Shared by the cache artifact (`tracks.txt`) and the tabular metadata
//! source (`tracks.csv`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Column holding the track id in the metadata source
pub const TRACK_ID_COLUMN: usize = 0;

/// Column holding the subset tag ("small", "medium", ...)
pub const SUBSET_COLUMN: usize = 32;

/// Column holding the top-level genre label
pub const GENRE_COLUMN: usize = 40;

/// Subsets accepted by default when scanning the metadata source
pub const DEFAULT_SUBSETS: [&str; 2] = ["small", "medium"];

/// Integer key derived from an audio file name
///
/// Leading zeros are not significant: `00005.mp3` and `5.mp3` map to the
/// same identifier, displayed as `5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(u64);

impl TrackId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Parse a raw id field, tolerating surrounding whitespace
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u64>().ok().map(Self)
    }

    /// Derive the identifier from a path: directory and everything from
    /// the first `.` of the file name onwards are dropped.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let stem = name.split('.').next()?;
        Self::parse(stem)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filesystem-safe genre name, usable directly as a path segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenreLabel(String);

impl GenreLabel {
    /// Normalize a raw genre string.
    ///
    /// Spaces become `_`, slashes and commas become `-`. Returns `None`
    /// for blank input and for `.` / `..`, which are not usable as a
    /// directory name.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            return None;
        }
        let label = trimmed.replace(' ', "_").replace(['/', '\\', ','], "-");
        Some(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GenreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GenreLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One line of the cache artifact: `<track_id> <genre>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub track_id: TrackId,
    pub genre: GenreLabel,
}

impl CacheRecord {
    pub fn new(track_id: TrackId, genre: GenreLabel) -> Self {
        Self { track_id, genre }
    }

    /// Parse a cache line. Anything after the id is taken as the genre
    /// and re-normalized, so lines written by older tools with unescaped
    /// spaces still load.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let track_id = TrackId::parse(tokens.next()?)?;
        let rest: Vec<&str> = tokens.collect();
        let genre = GenreLabel::normalize(&rest.join(" "))?;
        Some(Self { track_id, genre })
    }

    pub fn to_line(&self) -> String {
        format!("{} {}", self.track_id, self.genre)
    }
}

/// The three positional fields consumed from a metadata row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub track_id: TrackId,
    pub subset: String,
    pub genre: String,
}

impl MetadataRow {
    pub fn in_subset<S: AsRef<str>>(&self, accepted: &[S]) -> bool {
        accepted.iter().any(|s| s.as_ref() == self.subset)
    }
}
