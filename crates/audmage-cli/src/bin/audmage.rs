//! audmage - sort a collection by genre and encode it into images
//!
//! Usage: audmage <collection_dir> [modes...] [options...]
//!
//! Without any mode flag the run sorts audio, writes spectrograms and
//! audmages, and rewrites wrong genre tags.

use anyhow::Result;
use audmage_cli::{init_logger, output::print_json_report};
use audmage_core::config::{AudmageConfig, ModeConfig};
use audmage_core::{AudmageError, Pipeline};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "audmage")]
#[command(about = "Sort audio by genre and encode spectrograms and audmages", long_about = None)]
struct Args {
    /// Root of the audio collection
    path: PathBuf,

    /// Sort audio files into sorted/audio/<genre>/
    #[arg(long)]
    audio: bool,

    /// Write spectrograms to sorted/spect/<genre>/
    #[arg(long)]
    spect: bool,

    /// Write audmages to sorted/audmage/<genre>/
    #[arg(long)]
    audmage: bool,

    /// Create the directory structure for every genre found
    #[arg(long)]
    create: bool,

    /// Split the sorted images into dataset/<kind>/{train,test,validate}/
    #[arg(long)]
    dataset: bool,

    /// Copy audio files instead of moving them
    #[arg(long)]
    copy: bool,

    /// Rewrite embedded genre tags that disagree with the metadata
    #[arg(long)]
    retag: bool,

    /// Stop after N images have been written
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "5")]
    test: Option<usize>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that receives sorted/ and dataset/
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Genre cache file (tracks.txt)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Metadata table (tracks.csv)
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Encode worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed for the dataset shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Train, test and validate ratios, e.g. 0.8,0.1,0.1 or 70,20,10
    #[arg(long, value_delimiter = ',', value_name = "TRAIN,TEST,VALIDATE")]
    split: Option<Vec<f64>>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let config = build_config(&args).map_err(|e| {
        log::error!("{}", e);
        e
    })?;

    let report = Pipeline::new(config).run(&args.path).map_err(|e| {
        log::error!("{}", e);
        e
    })?;

    print_json_report(&report);
    Ok(())
}

/// Layer the command line over the config file (or the defaults)
fn build_config(args: &Args) -> audmage_core::Result<AudmageConfig> {
    let mut config = match &args.config {
        Some(path) => AudmageConfig::load(path)?,
        None => AudmageConfig::default(),
    };

    let requested = ModeConfig {
        sort_audio: args.audio,
        copy_audio: false,
        spect: args.spect,
        audmage: args.audmage,
        retag: args.retag,
        create_dirs: args.create,
        dataset: args.dataset,
    };
    if requested.any_selected() {
        config.modes = ModeConfig {
            copy_audio: config.modes.copy_audio,
            ..requested
        };
    } else if !config.modes.any_selected() {
        config.modes = ModeConfig {
            copy_audio: config.modes.copy_audio,
            ..ModeConfig::everything()
        };
    }
    config.modes.copy_audio |= args.copy;

    if let Some(limit) = args.test {
        config.encode.test_limit = Some(limit);
    }
    if let Some(workers) = args.workers {
        config.encode.workers = Some(workers);
    }
    if let Some(root) = &args.output {
        config.output.root = root.clone();
    }
    if let Some(cache) = &args.cache {
        config.index.cache_path = cache.clone();
    }
    if let Some(metadata) = &args.metadata {
        config.index.metadata_path = metadata.clone();
    }
    if let Some(seed) = args.seed {
        config.dataset.seed = Some(seed);
    }
    if let Some(split) = &args.split {
        match split.as_slice() {
            &[train, test, validate] => {
                config.dataset.train = train;
                config.dataset.test = test;
                config.dataset.validate = validate;
            }
            _ => {
                return Err(AudmageError::config(format!(
                    "--split takes three ratios, got {}",
                    split.len()
                )))
            }
        }
    }

    config.validate()?;
    Ok(config)
}
