//! Direct waveform-to-pixel encoding
//!
//! A waveform of any length and channel count becomes a square RGB image:
//! samples are scaled by the sample rate, remapped onto `[0, 255]`,
//! sorted per channel and laid out row-major as `L x L` three-byte pixels.

use crate::error::{AudmageError, Result};
use image::{Rgb, RgbImage};

#[cfg(test)]
mod tests;

/// Bytes per pixel of the encoded image
pub const PIXEL_CHANNELS: usize = 3;

/// Decoded samples, one row per channel
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    rows: Vec<Vec<f32>>,
}

impl Waveform {
    pub fn mono(samples: Vec<f32>) -> Self {
        Self { rows: vec![samples] }
    }

    pub fn from_channels(rows: Vec<Vec<f32>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn channels(&self) -> usize {
        self.rows.len()
    }

    /// Total sample count over all channels
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Square grid of RGB pixels, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMatrix {
    side: usize,
    data: Vec<u8>,
}

impl PixelMatrix {
    pub fn side(&self) -> usize {
        self.side
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let offset = (y * self.side + x) * PIXEL_CHANNELS;
        [self.data[offset], self.data[offset + 1], self.data[offset + 2]]
    }

    pub fn to_image(&self) -> RgbImage {
        let side = self.side as u32;
        RgbImage::from_fn(side, side, |x, y| Rgb(self.pixel(x as usize, y as usize)))
    }
}

/// Linearly map `x` from `[old_min, old_max]` onto `[new_min, new_max]`.
///
/// Either range may be given reversed. A degenerate range on either side
/// returns `x` unchanged.
pub fn remap(x: f32, old_min: f32, old_max: f32, new_min: f32, new_max: f32) -> f32 {
    if old_min == old_max || new_min == new_max {
        return x;
    }

    let reverse_input = old_min > old_max;
    let (old_lo, old_hi) = if reverse_input {
        (old_max, old_min)
    } else {
        (old_min, old_max)
    };

    let reverse_output = new_min > new_max;
    let (new_lo, new_hi) = if reverse_output {
        (new_max, new_min)
    } else {
        (new_min, new_max)
    };

    let portion = if reverse_input {
        (old_hi - x) * (new_hi - new_lo) / (old_hi - old_lo)
    } else {
        (x - old_lo) * (new_hi - new_lo) / (old_hi - old_lo)
    };

    if reverse_output {
        new_hi - portion
    } else {
        portion + new_lo
    }
}

/// Converts waveforms into [`PixelMatrix`] images. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct AudmageEncoder {
    /// Added to the computed side length so the grid always has room
    side_padding: usize,
}

impl Default for AudmageEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudmageEncoder {
    pub fn new() -> Self {
        Self { side_padding: 2 }
    }

    pub fn encode(&self, waveform: &Waveform, sample_rate: u32) -> Result<PixelMatrix> {
        let mut rows = normalize(waveform, sample_rate)?;

        if rows.len() == 1 {
            let copy = rows[0].clone();
            rows.push(copy);
        }

        let value_count: usize = rows.iter().map(Vec::len).sum();
        let side = self.side_length(value_count);

        for row in rows.iter_mut() {
            row.sort_by(|a, b| a.total_cmp(b));
        }

        // Surplus values are dropped from the end, any shortfall stays zero
        let capacity = side * side * PIXEL_CHANNELS;
        let mut data = vec![0u8; capacity];
        for (slot, value) in data.iter_mut().zip(rows.iter().flatten()) {
            *slot = *value as u8;
        }

        log::debug!(
            "Encoded {} values over {} channels into a {}x{} image",
            value_count,
            rows.len(),
            side,
            side
        );

        Ok(PixelMatrix { side, data })
    }

    /// `floor(sqrt(count / 3)) + padding`
    pub fn side_length(&self, value_count: usize) -> usize {
        isqrt(value_count / PIXEL_CHANNELS) + self.side_padding
    }
}

/// Scale by the sample rate and remap every channel onto `[0, 255]`
pub(crate) fn normalize(waveform: &Waveform, sample_rate: u32) -> Result<Vec<Vec<f32>>> {
    if waveform.is_empty() {
        return Err(AudmageError::EmptyWaveform);
    }

    let mut rows: Vec<Vec<f32>> = waveform.rows().to_vec();

    if sample_rate != 0 {
        let rate = sample_rate as f32;
        for value in rows.iter_mut().flatten() {
            *value /= rate;
        }
    }

    let (min, max) = rows
        .iter()
        .flatten()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if min == max {
        return Err(AudmageError::DegenerateRange(min));
    }

    for value in rows.iter_mut().flatten() {
        *value = remap(*value, min, max, 0.0, 255.0);
    }

    Ok(rows)
}

/// Integer square root, rounded down
fn isqrt(n: usize) -> usize {
    if n < 2 {
        return n;
    }
    let mut x = (n as f64).sqrt() as usize;
    while x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x
}
