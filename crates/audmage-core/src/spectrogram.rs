//! Short-time Fourier spectrogram rendered as a PNG-ready image
//!
//! Hann-windowed STFT of the mono mix, power in dB relative to the loudest
//! bin, coloured with a black-red-yellow-white "hot" map. Time runs left to
//! right, low frequencies sit at the bottom.

use crate::config::SpectrogramConfig;
use crate::error::{AudmageError, Result};
use image::{Rgb, RgbImage};
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Smallest power considered before taking the logarithm
const POWER_FLOOR: f32 = 1e-10;

/// Power spectrum in dB, `[time_frame][frequency_bin]`
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub power_db: Vec<Vec<f32>>,
    pub num_frames: usize,
    pub num_bins: usize,
}

impl Spectrogram {
    pub fn max_db(&self) -> f32 {
        self.power_db
            .iter()
            .flatten()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

#[derive(Debug, Clone)]
pub struct SpectrogramGenerator {
    config: SpectrogramConfig,
}

impl SpectrogramGenerator {
    pub fn new(config: SpectrogramConfig) -> Self {
        Self { config }
    }

    /// Compute the STFT power spectrum.
    ///
    /// Input shorter than one window is zero-padded to a single frame.
    pub fn compute(&self, samples: &[f32]) -> Result<Spectrogram> {
        let fft_size = self.config.fft_size;
        let hop_size = self.config.hop_size;
        if fft_size == 0 || hop_size == 0 {
            return Err(AudmageError::config("fft_size and hop_size must be > 0"));
        }
        if samples.is_empty() {
            return Err(AudmageError::EmptyWaveform);
        }

        let num_frames = 1 + samples.len().saturating_sub(fft_size) / hop_size;
        let num_bins = fft_size / 2 + 1;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let window = hann_window(fft_size);

        let mut power_db = Vec::with_capacity(num_frames);
        let mut frame = vec![Complex::new(0.0f32, 0.0); fft_size];

        for frame_idx in 0..num_frames {
            let start = frame_idx * hop_size;
            let end = (start + fft_size).min(samples.len());

            for (i, slot) in frame.iter_mut().enumerate() {
                let sample = if start + i < end { samples[start + i] } else { 0.0 };
                *slot = Complex::new(sample * window[i], 0.0);
            }

            fft.process(&mut frame);

            power_db.push(
                frame[..num_bins]
                    .iter()
                    .map(|c| 10.0 * c.norm_sqr().max(POWER_FLOOR).log10())
                    .collect(),
            );
        }

        Ok(Spectrogram {
            power_db,
            num_frames,
            num_bins,
        })
    }

    /// One column per frame, one row per bin
    pub fn render(&self, samples: &[f32]) -> Result<RgbImage> {
        let range = -self.config.min_db;
        if !range.is_finite() || range <= 0.0 {
            return Err(AudmageError::config(format!(
                "spectrogram min_db must be negative, got {}",
                self.config.min_db
            )));
        }

        let spectrogram = self.compute(samples)?;
        let max_db = spectrogram.max_db();
        let floor_db = max_db - range;

        let width = spectrogram.num_frames as u32;
        let height = spectrogram.num_bins as u32;

        Ok(RgbImage::from_fn(width, height, |x, y| {
            let bin = (height - 1 - y) as usize;
            let db = spectrogram.power_db[x as usize][bin].clamp(floor_db, max_db);
            hot((db - floor_db) / range)
        }))
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| {
            let x = i as f32 / (size - 1) as f32;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}

/// Map `level` in `[0, 1]` onto the hot colour scale
fn hot(level: f32) -> Rgb<u8> {
    let t = level.clamp(0.0, 1.0) * 3.0;
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb([channel(t), channel(t - 1.0), channel(t - 2.0)])
}
