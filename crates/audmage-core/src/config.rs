//! Run configuration
//!
//! One immutable value built at startup (from defaults, an optional TOML
//! file and command-line overrides) and handed to every component.

use crate::error::{AudmageError, Result};
use audmage_meta::DEFAULT_SUBSETS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tolerance when checking that split ratios add up
const RATIO_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudmageConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub modes: ModeConfig,
    #[serde(default)]
    pub encode: EncodeConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
}

/// Where the genre lookup comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,
    #[serde(default = "default_subsets")]
    pub accepted_subsets: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            metadata_path: default_metadata_path(),
            accepted_subsets: default_subsets(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("tracks.txt")
}
fn default_metadata_path() -> PathBuf {
    PathBuf::from("fma_metadata/tracks.csv")
}
fn default_subsets() -> Vec<String> {
    DEFAULT_SUBSETS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Parent of the `sorted/` and `dataset/` trees
    #[serde(default = "default_output_root")]
    pub root: PathBuf,
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            audio_extensions: default_audio_extensions(),
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_audio_extensions() -> Vec<String> {
    vec!["mp3".to_string()]
}

/// Which stages run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Relocate audio into `sorted/audio/<genre>/`
    #[serde(default)]
    pub sort_audio: bool,
    /// Copy instead of move when sorting audio
    #[serde(default)]
    pub copy_audio: bool,
    #[serde(default)]
    pub spect: bool,
    #[serde(default)]
    pub audmage: bool,
    /// Rewrite embedded genre tags that disagree with the metadata source
    #[serde(default)]
    pub retag: bool,
    /// Create the directory skeleton for every resolved genre
    #[serde(default)]
    pub create_dirs: bool,
    #[serde(default)]
    pub dataset: bool,
}

impl ModeConfig {
    /// The selection used when no mode is requested explicitly
    pub fn everything() -> Self {
        Self {
            sort_audio: true,
            copy_audio: false,
            spect: true,
            audmage: true,
            retag: true,
            create_dirs: false,
            dataset: false,
        }
    }

    pub fn any_selected(&self) -> bool {
        self.sort_audio || self.spect || self.audmage || self.retag || self.create_dirs || self.dataset
    }

    pub fn encodes_images(&self) -> bool {
        self.spect || self.audmage
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Worker threads for the encode stage; `None` uses available parallelism
    #[serde(default)]
    pub workers: Option<usize>,
    /// Rate audio is resampled to before audmage encoding; `None` keeps
    /// the decoded rate
    #[serde(default = "default_audmage_sample_rate")]
    pub audmage_sample_rate: Option<u32>,
    /// Stop after this many artifacts have been written
    #[serde(default)]
    pub test_limit: Option<usize>,
    #[serde(default)]
    pub spectrogram: SpectrogramConfig,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            workers: None,
            audmage_sample_rate: default_audmage_sample_rate(),
            test_limit: None,
            spectrogram: SpectrogramConfig::default(),
        }
    }
}

impl EncodeConfig {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

fn default_audmage_sample_rate() -> Option<u32> {
    Some(22050)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrogramConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    /// Dynamic range below the loudest bin, in dB (negative)
    #[serde(default = "default_min_db")]
    pub min_db: f32,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            hop_size: default_hop_size(),
            min_db: default_min_db(),
        }
    }
}

fn default_fft_size() -> usize {
    2048
}
fn default_hop_size() -> usize {
    512
}
fn default_min_db() -> f32 {
    -80.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_train")]
    pub train: f64,
    #[serde(default = "default_test")]
    pub test: f64,
    #[serde(default = "default_validate")]
    pub validate: f64,
    /// Fixed shuffle seed; `None` seeds from the OS
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            train: default_train(),
            test: default_test(),
            validate: default_validate(),
            seed: None,
        }
    }
}

fn default_train() -> f64 {
    0.8
}
fn default_test() -> f64 {
    0.1
}
fn default_validate() -> f64 {
    0.1
}

impl DatasetConfig {
    /// Ratios as fractions of one. Sums of 100 are read as percentages.
    pub fn fractions(&self) -> Result<[f64; 3]> {
        let ratios = [self.train, self.test, self.validate];
        if ratios.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(AudmageError::config(format!(
                "split ratios must be non-negative, got {:?}",
                ratios
            )));
        }

        let sum: f64 = ratios.iter().sum();
        if (sum - 1.0).abs() < RATIO_EPSILON {
            Ok(ratios)
        } else if (sum - 100.0).abs() < RATIO_EPSILON * 100.0 {
            Ok(ratios.map(|r| r / 100.0))
        } else {
            Err(AudmageError::config(format!(
                "split ratios must add up to 1, got {} ({:?})",
                sum, ratios
            )))
        }
    }
}

impl AudmageConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AudmageError::config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| AudmageError::config(format!("failed to parse TOML config: {}", e)))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.encode.workers == Some(0) {
            return Err(AudmageError::config("workers must be > 0"));
        }
        if self.encode.test_limit == Some(0) {
            return Err(AudmageError::config("test limit must be > 0"));
        }
        if self.encode.audmage_sample_rate == Some(0) {
            return Err(AudmageError::config("audmage sample rate must be > 0"));
        }
        let spect = &self.encode.spectrogram;
        if spect.fft_size == 0 || spect.hop_size == 0 {
            return Err(AudmageError::config("fft_size and hop_size must be > 0"));
        }
        if !spect.min_db.is_finite() || spect.min_db >= 0.0 {
            return Err(AudmageError::config(format!(
                "spectrogram min_db must be a negative number of dB, got {}",
                spect.min_db
            )));
        }
        if self.output.audio_extensions.is_empty() {
            return Err(AudmageError::config("at least one audio extension is required"));
        }
        if self.modes.dataset {
            if !self.modes.encodes_images() {
                return Err(AudmageError::config(
                    "no image set was chosen: dataset needs spect or audmage",
                ));
            }
            self.dataset.fractions()?;
        }
        Ok(())
    }
}
