//! Audmage Core - genre sorting and audio-to-image encoding
//!
//! Labels a collection of audio files with genres (metadata index first,
//! embedded tags second), sorts them into per-genre directories and turns
//! each one into a spectrogram and an "audmage", a direct pixel encoding
//! of the waveform. The sorted images can then be split into
//! train/test/validate sets.

pub mod artifact;
pub mod audio;
pub mod collector;
pub mod config;
pub mod encoder;
pub mod error;
pub mod index;
pub mod layout;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod spectrogram;
pub mod splitter;
pub mod tags;

pub use audmage_meta::{GenreLabel, TrackId};
pub use config::AudmageConfig;
pub use encoder::{remap, AudmageEncoder, PixelMatrix, Waveform};
pub use error::{AudmageError, Result};
pub use index::{IndexSource, MetadataIndex, ScanOutcome};
pub use layout::{ArtifactKind, Layout, Subset};
pub use pipeline::{LabeledTrack, Pipeline};
pub use report::{EncodeSummary, RunReport, SkipRecord, Stage};
pub use resolver::GenreResolver;
pub use splitter::{DatasetSplitter, SplitRatios, SplitSummary};
pub use tags::{Id3TagStore, TagStore};

/// Encode a single audio file, at its native rate, without touching any
/// directory layout
pub fn encode_file(path: &std::path::Path) -> Result<PixelMatrix> {
    let audio = audio::decode_audio(path).map_err(|e| AudmageError::corrupt(path, &e))?;
    AudmageEncoder::new().encode(&audio.to_waveform(), audio.sample_rate)
}
