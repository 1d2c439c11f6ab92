//! Audio decoding for multiple formats

use super::{decode_with_symphonia, resample_channels, AudioFormat};
use crate::encoder::Waveform;
use anyhow::{Context, Result};
use std::path::Path;

/// Decoded audio, interleaved, at the file's native rate
#[derive(Debug, Clone)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u32,
}

impl AudioData {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let duration_ms = duration_ms(samples.len(), sample_rate, channels);
        Self {
            samples,
            sample_rate,
            channels,
            duration_ms,
        }
    }

    /// Convert to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }

    /// Split the interleaved buffer into one row per channel.
    /// A trailing partial frame is dropped.
    pub fn to_waveform(&self) -> Waveform {
        let channels = self.channels.max(1) as usize;
        if channels == 1 {
            return Waveform::mono(self.samples.clone());
        }

        let frames = self.samples.len() / channels;
        let mut rows = vec![Vec::with_capacity(frames); channels];
        for frame in self.samples.chunks_exact(channels) {
            for (row, &sample) in rows.iter_mut().zip(frame) {
                row.push(sample);
            }
        }
        Waveform::from_channels(rows)
    }

    /// Resample all channels together, keeping the channel layout
    pub fn resampled(&self, target_rate: u32) -> Result<AudioData> {
        if self.sample_rate == target_rate || self.sample_rate == 0 {
            return Ok(self.clone());
        }

        let waveform = self.to_waveform();
        let rows = resample_channels(waveform.rows(), self.sample_rate, target_rate)?;

        let frames = rows.iter().map(Vec::len).min().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * rows.len());
        for i in 0..frames {
            for row in &rows {
                samples.push(row[i]);
            }
        }

        Ok(AudioData::new(samples, target_rate, rows.len() as u16))
    }
}

fn duration_ms(num_samples: usize, sample_rate: u32, channels: u16) -> u32 {
    let per_second = sample_rate as f64 * channels.max(1) as f64;
    if per_second == 0.0 {
        return 0;
    }
    (num_samples as f64 / per_second * 1000.0) as u32
}

/// Decode an audio file at its native rate and channel count
pub fn decode_audio(path: &Path) -> Result<AudioData> {
    if !path.exists() {
        anyhow::bail!("Audio file not found: {}", path.display());
    }

    match AudioFormat::from_path(path) {
        AudioFormat::Wav => decode_wav(path),
        AudioFormat::Mp3 => decode_mp3(path),
        AudioFormat::Flac => decode_flac(path),
        AudioFormat::Ogg => decode_ogg(path),
        AudioFormat::Other => decode_with_symphonia(path),
    }
}

/// Decode WAV file
fn decode_wav(path: &Path) -> Result<AudioData> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(AudioData::new(samples, spec.sample_rate, spec.channels))
}

/// Decode MP3 file
fn decode_mp3(path: &Path) -> Result<AudioData> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read MP3 file: {}", path.display()))?;

    let mut decoder = minimp3::Decoder::new(&data[..]);
    let mut samples = Vec::new();
    let mut sample_rate = 0;
    let mut channels = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = frame.sample_rate as u32;
                    channels = frame.channels as u16;
                }
                samples.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => anyhow::bail!("MP3 decode error in {}: {}", path.display(), e),
        }
    }

    Ok(AudioData::new(samples, sample_rate, channels))
}

/// Decode FLAC file
fn decode_flac(path: &Path) -> Result<AudioData> {
    let mut reader = claxon::FlacReader::open(path)
        .with_context(|| format!("Failed to open FLAC file: {}", path.display()))?;

    let info = reader.streaminfo();
    let max_val = (1i64 << (info.bits_per_sample - 1)) as f32;
    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / max_val))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AudioData::new(samples, info.sample_rate, info.channels as u16))
}

/// Decode OGG Vorbis file
fn decode_ogg(path: &Path) -> Result<AudioData> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open OGG file: {}", path.display()))?;

    let mut reader = lewton::inside_ogg::OggStreamReader::new(file)?;

    let sample_rate = reader.ident_hdr.audio_sample_rate;
    let channels = reader.ident_hdr.audio_channels as u16;

    let mut samples = Vec::new();
    while let Some(packet) = reader.read_dec_packet_itl()? {
        samples.extend(packet.iter().map(|&s| s as f32 / 32768.0));
    }

    Ok(AudioData::new(samples, sample_rate, channels))
}
