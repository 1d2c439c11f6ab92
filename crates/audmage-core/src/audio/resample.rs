//! Band-limited resampling with rubato

use anyhow::{Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Resample planar channels of equal length to the target rate.
///
/// The whole signal is processed as a single chunk through a windowed sinc
/// filter, so content above the target Nyquist is removed rather than
/// folded back.
pub fn resample_channels(channels: &[Vec<f32>], from_rate: u32, to_rate: u32) -> Result<Vec<Vec<f32>>> {
    if to_rate == 0 {
        anyhow::bail!("Target sample rate must be > 0");
    }

    let frames = channels.first().map(Vec::len).unwrap_or(0);
    if from_rate == to_rate || from_rate == 0 || frames == 0 {
        return Ok(channels.to_vec());
    }
    if channels.iter().any(|c| c.len() != frames) {
        anyhow::bail!("Channels differ in length");
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        2.0,
        params,
        frames,
        channels.len(),
    )
    .context("Failed to create resampler")?;

    let output = resampler
        .process(channels, None)
        .context("Resampling failed")?;

    log::debug!(
        "Resampled {} frames ({} Hz) to {} frames ({} Hz)",
        frames,
        from_rate,
        output.first().map(Vec::len).unwrap_or(0),
        to_rate
    );

    Ok(output)
}
