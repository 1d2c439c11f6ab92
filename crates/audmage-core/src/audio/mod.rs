//! Audio decoding and resampling
//!
//! WAV, MP3, FLAC and OGG use dedicated pure Rust decoders; anything else
//! is handed to Symphonia's probe.

mod decoder;
mod probe;
mod resample;

pub use decoder::{decode_audio, AudioData};
pub use probe::decode_with_symphonia;
pub use resample::resample_channels;

use std::path::Path;

/// Audio formats with a dedicated decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
    /// Left to the Symphonia probe (M4A, MKA, ...)
    Other,
}

impl AudioFormat {
    /// Detect format from file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("wav") | Some("wave") => AudioFormat::Wav,
            Some("mp3") => AudioFormat::Mp3,
            Some("flac") => AudioFormat::Flac,
            Some("ogg") | Some("oga") => AudioFormat::Ogg,
            _ => AudioFormat::Other,
        }
    }
}
