//! Error taxonomy
//!
//! Per-file variants are reported and skipped by the pipeline; only
//! `Configuration` aborts a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudmageError {
    /// Source path vanished between enumeration and processing
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Neither the metadata index nor the embedded tag produced a genre
    #[error("no genre found for {}", .0.display())]
    GenreNotFound(PathBuf),

    #[error("waveform has no samples")]
    EmptyWaveform,

    /// Every value of the scaled waveform equals this one
    #[error("waveform is constant ({0}); remap range is degenerate")]
    DegenerateRange(f32),

    /// A different file already occupies the sort destination
    #[error("{} already exists and differs from {}", dest.display(), src.display())]
    DestinationExists { src: PathBuf, dest: PathBuf },

    #[error("could not decode {}: {reason}", path.display())]
    CorruptAudio { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("tag error on {}: {reason}", path.display())]
    Tag { path: PathBuf, reason: String },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AudmageError {
    pub fn config(msg: impl Into<String>) -> Self {
        AudmageError::Configuration(msg.into())
    }

    pub fn corrupt(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        AudmageError::CorruptAudio {
            path: path.into(),
            reason: format!("{:#}", err),
        }
    }

    /// Only configuration problems end a run
    pub fn is_fatal(&self) -> bool {
        matches!(self, AudmageError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, AudmageError>;
