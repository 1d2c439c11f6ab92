//! End-to-end runs over synthesised WAV collections

use super::*;
use crate::config::{ModeConfig, SpectrogramConfig};
use crate::index::{tests::write_metadata, IndexSource};
use crate::tags::testing::RecordingTagStore;
use std::f32::consts::PI;
use std::fs;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fs::create_dir_all(fixture.collection()).unwrap();
        fixture
    }

    fn collection(&self) -> PathBuf {
        self.dir.path().join("music")
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn write_wav(&self, name: &str, channels: u16, frames: usize, freq: f32) -> PathBuf {
        let path = self.collection().join(name);
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for n in 0..frames {
            let value = (2.0 * PI * freq * n as f32 / 8000.0).sin();
            for ch in 0..channels {
                let scale = 0.8 / (ch as f32 + 1.0);
                writer.write_sample((value * scale * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
        path
    }

    fn config(&self, modes: ModeConfig) -> AudmageConfig {
        let mut config = AudmageConfig::default();
        config.index.cache_path = self.dir.path().join("tracks.txt");
        config.index.metadata_path = self.dir.path().join("tracks.csv");
        config.output.root = self.out();
        config.output.audio_extensions = vec!["wav".to_string()];
        config.modes = modes;
        config.encode.workers = Some(2);
        config.encode.audmage_sample_rate = Some(4000);
        config.encode.spectrogram = SpectrogramConfig {
            fft_size: 256,
            hop_size: 128,
            min_db: -80.0,
        };
        config
    }
}

fn image_modes() -> ModeConfig {
    ModeConfig {
        sort_audio: true,
        spect: true,
        audmage: true,
        ..ModeConfig::default()
    }
}

#[test]
fn test_full_run_sorts_and_encodes() {
    let fx = Fixture::new();
    fx.write_wav("00005.wav", 2, 4000, 440.0);
    fx.write_wav("00002.wav", 1, 2000, 220.0);
    let intro = fx.write_wav("intro.wav", 1, 500, 330.0);
    write_metadata(
        &fx.dir.path().join("tracks.csv"),
        &[("2", "small", "Hip-Hop"), ("5", "medium", "Rock")],
    );

    let store = Arc::new(RecordingTagStore::default());
    let pipeline = Pipeline::with_tag_store(fx.config(image_modes()), store.clone());
    let report = pipeline.run(&fx.collection()).unwrap();

    assert_eq!(report.files_found, 3);
    assert_eq!(report.labeled, 2);
    assert_eq!(report.sorted, 2);
    assert_eq!(report.index_source, IndexSource::Scan);
    assert_eq!(report.encode.written, 4);
    assert_eq!(report.encode.failed, 0);
    assert_eq!(report.skipped_in(Stage::Resolve), 1);
    assert_eq!(report.skipped[0].path, intro);
    assert!(report.split.is_none());

    // Indexed files never touch their tags
    assert_eq!(store.reads(), vec![intro]);

    let out = fx.out();
    assert!(out.join("sorted/audio/Rock/00005.wav").is_file());
    assert!(out.join("sorted/audio/Hip-Hop/00002.wav").is_file());
    assert!(!fx.collection().join("00005.wav").exists());
    assert!(out.join("sorted/spect/Rock/00005.png").is_file());
    assert!(out.join("sorted/spect/Hip-Hop/00002.png").is_file());

    // Stereo 4000 frames at 8 kHz, resampled to 4 kHz: about 4000 values,
    // floor(sqrt(4000 / 3)) + 2 = 38
    let audmage = image::open(out.join("sorted/audmage/Rock/00005.png")).unwrap();
    assert_eq!((audmage.width(), audmage.height()), (38, 38));

    let spect = image::open(out.join("sorted/spect/Rock/00005.png")).unwrap();
    assert_eq!(spect.height(), 129);

    let cache = fs::read_to_string(fx.dir.path().join("tracks.txt")).unwrap();
    assert_eq!(cache, "2 Hip-Hop\n5 Rock\n");
}

#[test]
fn test_rerun_skips_existing_artifacts() {
    let fx = Fixture::new();
    fx.write_wav("00005.wav", 1, 3000, 440.0);
    write_metadata(&fx.dir.path().join("tracks.csv"), &[("5", "small", "Rock")]);

    let mut modes = image_modes();
    modes.copy_audio = true;
    let config = fx.config(modes);

    let first = Pipeline::with_tag_store(config.clone(), Arc::new(RecordingTagStore::default()))
        .run(&fx.collection())
        .unwrap();
    assert_eq!(first.encode.written, 2);
    assert!(fx.collection().join("00005.wav").exists());

    let second = Pipeline::with_tag_store(config, Arc::new(RecordingTagStore::default()))
        .run(&fx.collection())
        .unwrap();
    assert_eq!(second.index_source, IndexSource::Cache);
    assert_eq!(second.encode.written, 0);
    assert_eq!(second.encode.already_present, 2);
}

#[test]
fn test_test_limit_cancels_remaining_work() {
    let fx = Fixture::new();
    for id in 1..=3 {
        fx.write_wav(&format!("{:05}.wav", id), 1, 1000, 100.0 * id as f32);
    }
    write_metadata(
        &fx.dir.path().join("tracks.csv"),
        &[("1", "small", "Rock"), ("2", "small", "Rock"), ("3", "small", "Rock")],
    );

    let mut config = fx.config(ModeConfig {
        audmage: true,
        ..ModeConfig::default()
    });
    config.encode.workers = Some(1);
    config.encode.test_limit = Some(1);

    let report = Pipeline::with_tag_store(config, Arc::new(RecordingTagStore::default()))
        .run(&fx.collection())
        .unwrap();

    assert_eq!(report.labeled, 3);
    assert_eq!(report.sorted, 0);
    assert_eq!(report.encode.written, 1);
    assert_eq!(report.encode.cancelled, 2);
}

#[test]
fn test_test_limit_counts_each_image() {
    let fx = Fixture::new();
    for id in 1..=3 {
        fx.write_wav(&format!("{:05}.wav", id), 1, 1000, 100.0 * id as f32);
    }
    write_metadata(
        &fx.dir.path().join("tracks.csv"),
        &[("1", "small", "Rock"), ("2", "small", "Rock"), ("3", "small", "Rock")],
    );

    let mut config = fx.config(ModeConfig {
        spect: true,
        audmage: true,
        ..ModeConfig::default()
    });
    config.encode.workers = Some(1);
    config.encode.test_limit = Some(3);

    let report = Pipeline::with_tag_store(config, Arc::new(RecordingTagStore::default()))
        .run(&fx.collection())
        .unwrap();

    // Two images for the first track, one for the second, then stop
    assert_eq!(report.encode.written, 3);
    assert_eq!(report.encode.cancelled, 2);
    let written = ["spect", "audmage"]
        .iter()
        .map(|kind| fs::read_dir(fx.out().join("sorted").join(kind).join("Rock")).map_or(0, |d| d.count()))
        .sum::<usize>();
    assert_eq!(written, 3);
}

#[test]
fn test_same_name_in_one_genre_is_not_overwritten() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.collection().join("a")).unwrap();
    fs::create_dir_all(fx.collection().join("b")).unwrap();
    let first = fx.write_wav("a/intro.wav", 1, 500, 220.0);
    let second = fx.write_wav("b/intro.wav", 1, 500, 440.0);

    let store = RecordingTagStore::default()
        .with_genre(&first, "Rock")
        .with_genre(&second, "Rock");
    let config = fx.config(ModeConfig {
        sort_audio: true,
        ..ModeConfig::default()
    });
    let report = Pipeline::with_tag_store(config, Arc::new(store))
        .run(&fx.collection())
        .unwrap();

    assert_eq!(report.sorted, 1);
    assert_eq!(report.labeled, 1);
    assert_eq!(report.skipped_in(Stage::Sort), 1);
    assert_eq!(report.skipped[0].path, second);
    assert!(second.exists());
    assert!(fx.out().join("sorted/audio/Rock/intro.wav").is_file());
}

#[test]
fn test_corrupt_audio_is_skipped() {
    let fx = Fixture::new();
    fx.write_wav("00005.wav", 1, 1000, 440.0);
    let broken = fx.collection().join("00006.wav");
    fs::write(&broken, b"not a wav file").unwrap();
    write_metadata(
        &fx.dir.path().join("tracks.csv"),
        &[("5", "small", "Rock"), ("6", "small", "Rock")],
    );

    let config = fx.config(ModeConfig {
        audmage: true,
        ..ModeConfig::default()
    });
    let report = Pipeline::with_tag_store(config, Arc::new(RecordingTagStore::default()))
        .run(&fx.collection())
        .unwrap();

    assert_eq!(report.encode.written, 1);
    assert_eq!(report.encode.failed, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].stage, Stage::Audmage);
    assert_eq!(report.skipped[0].path, broken);
    assert!(!fx.out().join("sorted/audmage/Rock/00006.png").exists());
}

#[test]
fn test_dataset_split_after_encoding() {
    let fx = Fixture::new();
    let mut rows = Vec::new();
    for id in 1..=10 {
        fx.write_wav(&format!("{:05}.wav", id), 1, 800, 50.0 * id as f32);
        rows.push(id.to_string());
    }
    let rows: Vec<(&str, &str, &str)> = rows.iter().map(|id| (id.as_str(), "small", "Folk")).collect();
    write_metadata(&fx.dir.path().join("tracks.csv"), &rows);

    let mut config = fx.config(ModeConfig {
        audmage: true,
        dataset: true,
        ..ModeConfig::default()
    });
    config.dataset.seed = Some(3);

    let report = Pipeline::with_tag_store(config, Arc::new(RecordingTagStore::default()))
        .run(&fx.collection())
        .unwrap();

    let split = report.split.unwrap();
    assert_eq!([split.train, split.test, split.validate], [8, 1, 1]);
    assert_eq!(split.companions, 0);

    let train = fx.out().join("dataset/audmage/train/Folk");
    assert_eq!(fs::read_dir(train).unwrap().count(), 8);
}

#[test]
fn test_dataset_without_images_is_configuration_error() {
    let fx = Fixture::new();
    let track = fx.write_wav("00005.wav", 1, 500, 440.0);
    write_metadata(&fx.dir.path().join("tracks.csv"), &[("5", "small", "Rock")]);

    let config = fx.config(ModeConfig {
        sort_audio: true,
        dataset: true,
        ..ModeConfig::default()
    });

    let err = Pipeline::with_tag_store(config, Arc::new(RecordingTagStore::default()))
        .run(&fx.collection())
        .unwrap_err();
    assert!(err.is_fatal());

    // Rejected before anything was moved
    assert!(track.exists());
    assert!(!fx.out().join("sorted").exists());
}

#[test]
fn test_create_only_builds_skeleton() {
    let fx = Fixture::new();
    fx.write_wav("00005.wav", 1, 500, 440.0);
    write_metadata(&fx.dir.path().join("tracks.csv"), &[("5", "small", "Rock")]);

    let config = fx.config(ModeConfig {
        create_dirs: true,
        ..ModeConfig::default()
    });
    let report = Pipeline::with_tag_store(config, Arc::new(RecordingTagStore::default()))
        .run(&fx.collection())
        .unwrap();

    assert_eq!(report.labeled, 1);
    assert_eq!(report.encode, EncodeSummary::default());
    for kind in ["audio", "spect", "audmage"] {
        assert!(fx.out().join("sorted").join(kind).join("Rock").is_dir());
    }
    assert!(fx.collection().join("00005.wav").exists());
}

#[test]
fn test_missing_collection_is_fatal() {
    let fx = Fixture::new();
    let config = fx.config(image_modes());
    let err = Pipeline::with_tag_store(config, Arc::new(RecordingTagStore::default()))
        .run(&fx.dir.path().join("nowhere"))
        .unwrap_err();
    assert!(matches!(err, AudmageError::Configuration(_)));
}
