//! Tests for the audmage encoder

use super::*;
use approx::assert_relative_eq;

#[test]
fn test_remap_endpoints() {
    for (lo, hi) in [(-2.0f32, 2.0f32), (0.0, 1.0), (-0.5, 0.25)] {
        assert_eq!(remap(lo, lo, hi, 0.0, 255.0), 0.0);
        assert_eq!(remap(hi, lo, hi, 0.0, 255.0), 255.0);
    }
    assert_relative_eq!(remap(0.5, 0.0, 1.0, 0.0, 255.0), 127.5);
}

#[test]
fn test_remap_reversed_ranges() {
    assert_eq!(remap(-2.0, -2.0, 2.0, 255.0, 0.0), 255.0);
    assert_eq!(remap(2.0, -2.0, 2.0, 255.0, 0.0), 0.0);

    // Reversed input mirrors the fraction
    assert_eq!(remap(2.0, 2.0, -2.0, 0.0, 255.0), 0.0);
    assert_eq!(remap(-2.0, 2.0, -2.0, 0.0, 255.0), 255.0);
}

#[test]
fn test_remap_degenerate_range_is_identity() {
    assert_eq!(remap(3.5, 1.0, 1.0, 0.0, 255.0), 3.5);
    assert_eq!(remap(3.5, 0.0, 10.0, 7.0, 7.0), 3.5);
}

#[test]
fn test_normalize_scenario() {
    let waveform = Waveform::mono(vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
    let rows = normalize(&waveform, 1).unwrap();

    assert_eq!(rows.len(), 1);
    let expected = [0.0, 63.75, 127.5, 191.25, 255.0];
    for (got, want) in rows[0].iter().zip(expected) {
        assert_relative_eq!(*got, want);
    }
}

#[test]
fn test_encode_scenario_layout() {
    let waveform = Waveform::mono(vec![2.0, -1.0, 0.0, -2.0, 1.0]);
    let matrix = AudmageEncoder::new().encode(&waveform, 1).unwrap();

    // 10 values after stacking: floor(sqrt(10 / 3)) + 2
    assert_eq!(matrix.side(), 3);
    assert_eq!(matrix.as_bytes().len(), 27);

    let mut expected = vec![0u8, 63, 127, 191, 255, 0, 63, 127, 191, 255];
    expected.resize(27, 0);
    assert_eq!(matrix.as_bytes(), expected.as_slice());

    assert_eq!(matrix.pixel(0, 0), [0, 63, 127]);
    assert_eq!(matrix.pixel(1, 0), [191, 255, 0]);
    assert_eq!(matrix.pixel(2, 2), [0, 0, 0]);
}

#[test]
fn test_encode_is_deterministic() {
    let samples: Vec<f32> = (0..4000).map(|i| ((i as f32) * 0.013).sin()).collect();
    let waveform = Waveform::from_channels(vec![samples.clone(), samples.iter().map(|s| s * 0.5).collect()]);

    let encoder = AudmageEncoder::default();
    let a = encoder.encode(&waveform, 22050).unwrap();
    let b = encoder.encode(&waveform, 22050).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_all_zero_waveform_is_degenerate() {
    let waveform = Waveform::mono(vec![0.0; 64]);
    let err = AudmageEncoder::new().encode(&waveform, 22050).unwrap_err();
    assert!(matches!(err, AudmageError::DegenerateRange(_)));
}

#[test]
fn test_empty_waveform() {
    let encoder = AudmageEncoder::new();
    assert!(matches!(
        encoder.encode(&Waveform::mono(Vec::new()), 22050),
        Err(AudmageError::EmptyWaveform)
    ));
    assert!(matches!(
        encoder.encode(&Waveform::from_channels(vec![Vec::new(), Vec::new()]), 22050),
        Err(AudmageError::EmptyWaveform)
    ));
}

#[test]
fn test_mono_matches_duplicated_stereo() {
    let samples = vec![0.3, -0.7, 0.1, 0.9, -0.2, 0.0];
    let encoder = AudmageEncoder::new();

    let mono = encoder.encode(&Waveform::mono(samples.clone()), 0).unwrap();
    let stereo = encoder
        .encode(&Waveform::from_channels(vec![samples.clone(), samples]), 0)
        .unwrap();
    assert_eq!(mono, stereo);
}

#[test]
fn test_rows_sorted_independently() {
    let waveform = Waveform::from_channels(vec![vec![4.0, 0.0], vec![2.0, 3.0]]);
    let matrix = AudmageEncoder::new().encode(&waveform, 0).unwrap();

    // Remapped: left [255, 0] -> sorted [0, 255]; right [127.5, 191.25]
    assert_eq!(&matrix.as_bytes()[..4], &[0, 255, 127, 191]);
}

#[test]
fn test_side_length() {
    let encoder = AudmageEncoder::new();
    assert_eq!(encoder.side_length(0), 2);
    assert_eq!(encoder.side_length(10), 3);
    assert_eq!(encoder.side_length(12), 4);
    assert_eq!(encoder.side_length(3 * 100 * 100), 102);
    assert_eq!(encoder.side_length(3 * 100 * 100 - 1), 101);
}

#[test]
fn test_surplus_is_truncated() {
    // Capacity always exceeds the value count, so nothing real is lost
    let samples: Vec<f32> = (0..1000).map(|i| i as f32).collect();
    let matrix = AudmageEncoder::new().encode(&Waveform::mono(samples), 0).unwrap();
    let side = matrix.side();
    assert!(side * side * 3 >= 2000);
    assert_eq!(matrix.as_bytes()[1999], 255);
    assert!(matrix.as_bytes()[2000..].iter().all(|&b| b == 0));
}

#[test]
fn test_to_image() {
    let waveform = Waveform::mono(vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
    let matrix = AudmageEncoder::new().encode(&waveform, 1).unwrap();
    let image = matrix.to_image();
    assert_eq!(image.dimensions(), (3, 3));
    assert_eq!(image.get_pixel(1, 0).0, [191, 255, 0]);
}
