//! metamatch - build the genre cache for a collection
//!
//! Usage: metamatch <collection_dir> [--metadata tracks.csv] [--cache tracks.txt]
//!
//! Scans the metadata table once for every audio file under the collection
//! and appends the matches to the cache, so later audmage runs can skip
//! the scan.

use anyhow::{Context, Result};
use audmage_cli::{
    init_logger,
    output::{print_json_summary, MatchSummary},
};
use audmage_core::collector::collect_audio_files;
use audmage_core::config::IndexConfig;
use audmage_core::MetadataIndex;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "metamatch")]
#[command(about = "Match audio files against the metadata table and cache their genres", long_about = None)]
struct Args {
    /// Root of the audio collection
    path: PathBuf,

    /// Metadata table (tracks.csv)
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Genre cache file to append to (tracks.txt)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Audio file extension to look for (repeatable)
    #[arg(long = "ext", default_value = "mp3")]
    extensions: Vec<String>,

    /// Accepted subset values (repeatable); defaults to small and medium
    #[arg(long = "subset")]
    subsets: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let summary = run_metamatch(&args)?;
    print_json_summary(&summary);
    Ok(())
}

fn run_metamatch(args: &Args) -> Result<MatchSummary> {
    if !args.path.is_dir() {
        anyhow::bail!("Collection directory not found: {}", args.path.display());
    }

    let mut config = IndexConfig::default();
    if let Some(metadata) = &args.metadata {
        config.metadata_path = metadata.clone();
    }
    if let Some(cache) = &args.cache {
        config.cache_path = cache.clone();
    }
    if !args.subsets.is_empty() {
        config.accepted_subsets = args.subsets.clone();
    }

    let files = collect_audio_files(&args.path, &args.extensions);

    let start = std::time::Instant::now();
    let outcome = MetadataIndex::scan(&config.metadata_path, &files, &config.accepted_subsets)?;
    log::info!(
        "Matched {} of {} files in {:.2}s",
        outcome.index.len(),
        files.len(),
        start.elapsed().as_secs_f64()
    );

    outcome
        .index
        .persist(&config.cache_path)
        .with_context(|| format!("Failed to write cache: {}", config.cache_path.display()))?;

    Ok(MatchSummary {
        files: files.len(),
        matched: outcome.index.len(),
        unmatched: outcome.unmatched,
        cache_path: config.cache_path,
    })
}
