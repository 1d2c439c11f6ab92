//! End-to-end run over a collection directory
//!
//! Stages, in order:
//! 1. collect candidate audio files
//! 2. load the genre index (must finish before any lookup)
//! 3. resolve and sort each file, one at a time
//! 4. encode spectrograms and audmages in a worker pool
//! 5. optionally split the sorted images into a dataset

use crate::artifact::{write_if_absent, WriteStatus};
use crate::audio::{decode_audio, AudioData};
use crate::collector::collect_audio_files;
use crate::config::AudmageConfig;
use crate::encoder::AudmageEncoder;
use crate::error::{AudmageError, Result};
use crate::index::MetadataIndex;
use crate::layout::{relocate, ArtifactKind, Layout};
use crate::report::{EncodeSummary, RunReport, SkipRecord, Stage};
use crate::resolver::GenreResolver;
use crate::spectrogram::SpectrogramGenerator;
use crate::splitter::{choose_primary_kind, DatasetSplitter, SplitSummary};
use crate::tags::{Id3TagStore, TagStore};
use audmage_meta::GenreLabel;
use chrono::Utc;
use image::RgbImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A file with its resolved genre, at its current location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledTrack {
    pub path: PathBuf,
    pub genre: GenreLabel,
}

enum ArtifactOutcome {
    Written,
    AlreadyPresent,
    Failed(SkipRecord),
    Cancelled,
}

pub struct Pipeline {
    config: AudmageConfig,
    tags: Arc<dyn TagStore>,
    encoder: AudmageEncoder,
    spectrogram: SpectrogramGenerator,
}

impl Pipeline {
    pub fn new(config: AudmageConfig) -> Self {
        Self::with_tag_store(config, Arc::new(Id3TagStore::new()))
    }

    pub fn with_tag_store(config: AudmageConfig, tags: Arc<dyn TagStore>) -> Self {
        let spectrogram = SpectrogramGenerator::new(config.encode.spectrogram.clone());
        Self {
            config,
            tags,
            encoder: AudmageEncoder::new(),
            spectrogram,
        }
    }

    pub fn config(&self) -> &AudmageConfig {
        &self.config
    }

    /// Process every audio file under `collection`.
    ///
    /// Only configuration problems are returned as errors; files that fail
    /// at any stage are listed in the report and skipped.
    pub fn run(&self, collection: &Path) -> Result<RunReport> {
        let started_at = Utc::now();
        self.config.validate()?;

        if !collection.is_dir() {
            return Err(AudmageError::config(format!(
                "collection {} is not a directory",
                collection.display()
            )));
        }

        let files = collect_audio_files(collection, &self.config.output.audio_extensions);
        let index = MetadataIndex::load(&self.config.index, &files);
        let layout = Layout::new(&self.config.output.root);
        let mut skipped = Vec::new();

        let (tracks, sorted) = self.label_and_sort(&files, &index, &layout, &mut skipped);
        log::info!("Labeled {} of {} files", tracks.len(), files.len());

        let encode = if self.config.modes.encodes_images() {
            self.encode_all(&tracks, &layout, &mut skipped)?
        } else {
            EncodeSummary::default()
        };

        let split = if self.config.modes.dataset {
            Some(self.split(&layout, &mut skipped)?)
        } else {
            None
        };

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            collection: collection.to_path_buf(),
            files_found: files.len(),
            labeled: tracks.len(),
            index_source: index.source(),
            index_entries: index.len(),
            sorted,
            encode,
            split,
            skipped,
        })
    }

    /// Kinds whose directories a run writes to
    fn enabled_kinds(&self) -> Vec<ArtifactKind> {
        let modes = &self.config.modes;
        let kinds: Vec<ArtifactKind> = [
            (modes.sort_audio, ArtifactKind::Audio),
            (modes.spect, ArtifactKind::Spect),
            (modes.audmage, ArtifactKind::Audmage),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect();

        // A bare `create` run lays out the full skeleton
        if kinds.is_empty() && modes.create_dirs {
            return vec![ArtifactKind::Audio, ArtifactKind::Spect, ArtifactKind::Audmage];
        }
        kinds
    }

    /// Resolve each file's genre and, if enabled, move it into the sorted
    /// audio tree. Returns the labeled tracks and the number relocated.
    fn label_and_sort(
        &self,
        files: &[PathBuf],
        index: &MetadataIndex,
        layout: &Layout,
        skipped: &mut Vec<SkipRecord>,
    ) -> (Vec<LabeledTrack>, usize) {
        let modes = &self.config.modes;
        let resolver = GenreResolver::new(index, self.tags.clone(), modes.retag);
        let kinds = self.enabled_kinds();
        let mut tracks = Vec::with_capacity(files.len());
        let mut sorted = 0;

        for path in files {
            let genre = match resolver.resolve(path) {
                Ok(genre) => genre,
                Err(e) => {
                    skipped.push(SkipRecord::new(path, Stage::Resolve, &e));
                    continue;
                }
            };

            if modes.create_dirs {
                if let Err(e) = layout.ensure_genre_dirs(&genre, &kinds, modes.dataset) {
                    skipped.push(SkipRecord::new(path, Stage::Sort, &e));
                    continue;
                }
            }

            let path = if modes.sort_audio {
                let dest_dir = layout.sorted_dir(ArtifactKind::Audio, &genre);
                match relocate(path, &dest_dir, modes.copy_audio) {
                    Ok(dest) => {
                        log::debug!("Sorted {} -> {}", path.display(), dest.display());
                        sorted += 1;
                        dest
                    }
                    Err(e) => {
                        skipped.push(SkipRecord::new(path, Stage::Sort, &e));
                        continue;
                    }
                }
            } else {
                path.clone()
            };

            tracks.push(LabeledTrack { path, genre });
        }

        (tracks, sorted)
    }

    /// Encode every track on a dedicated pool of `encode.workers` threads
    fn encode_all(
        &self,
        tracks: &[LabeledTrack],
        layout: &Layout,
        skipped: &mut Vec<SkipRecord>,
    ) -> Result<EncodeSummary> {
        let workers = self.config.encode.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| AudmageError::config(format!("failed to start worker pool: {}", e)))?;

        log::info!("Encoding {} tracks on {} workers", tracks.len(), workers);

        let produced = AtomicUsize::new(0);
        let start = std::time::Instant::now();

        let outcomes: Vec<ArtifactOutcome> = pool.install(|| {
            tracks
                .par_iter()
                .flat_map_iter(|track| self.encode_track(track, layout, &produced))
                .collect()
        });

        let mut summary = EncodeSummary::default();
        for outcome in outcomes {
            match outcome {
                ArtifactOutcome::Written => summary.written += 1,
                ArtifactOutcome::AlreadyPresent => summary.already_present += 1,
                ArtifactOutcome::Cancelled => summary.cancelled += 1,
                ArtifactOutcome::Failed(record) => {
                    summary.failed += 1;
                    skipped.push(record);
                }
            }
        }

        let elapsed = start.elapsed();
        log::info!(
            "Wrote {} artifacts in {:.2}s ({} already present, {} failed)",
            summary.written,
            elapsed.as_secs_f64(),
            summary.already_present,
            summary.failed
        );
        if summary.cancelled > 0 {
            log::info!("Test limit reached, {} work items not encoded", summary.cancelled);
        }

        Ok(summary)
    }

    /// Produce every enabled image for one track, decoding it at most once.
    /// The test limit is checked before each image.
    fn encode_track(&self, track: &LabeledTrack, layout: &Layout, produced: &AtomicUsize) -> Vec<ArtifactOutcome> {
        let limit_reached = || {
            self.config
                .encode
                .test_limit
                .is_some_and(|limit| produced.load(Ordering::SeqCst) >= limit)
        };
        if limit_reached() {
            return vec![ArtifactOutcome::Cancelled];
        }

        let modes = &self.config.modes;
        let kinds = [(modes.spect, ArtifactKind::Spect), (modes.audmage, ArtifactKind::Audmage)];
        let mut decoded: Option<AudioData> = None;
        let mut outcomes = Vec::with_capacity(kinds.len());

        for kind in kinds.into_iter().filter_map(|(on, kind)| on.then_some(kind)) {
            if limit_reached() {
                outcomes.push(ArtifactOutcome::Cancelled);
                break;
            }

            let stage = match kind {
                ArtifactKind::Spect => Stage::Spect,
                _ => Stage::Audmage,
            };

            let written = layout
                .artifact_path(kind, &track.genre, &track.path)
                .and_then(|dest| {
                    let status = write_if_absent(&dest, || {
                        let audio = load_once(&mut decoded, &track.path)?;
                        self.render(kind, audio, &track.path)
                    })?;
                    Ok((dest, status))
                });

            outcomes.push(match written {
                Ok((dest, WriteStatus::Written)) => {
                    let n = produced.fetch_add(1, Ordering::SeqCst) + 1;
                    log::info!("Finished {}({}): {}", kind, n, dest.display());
                    ArtifactOutcome::Written
                }
                Ok((dest, WriteStatus::AlreadyExists)) => {
                    log::debug!("{} already exists", dest.display());
                    ArtifactOutcome::AlreadyPresent
                }
                Err(e) => ArtifactOutcome::Failed(SkipRecord::new(&track.path, stage, &e)),
            });
        }

        outcomes
    }

    fn render(&self, kind: ArtifactKind, audio: &AudioData, path: &Path) -> Result<RgbImage> {
        match kind {
            ArtifactKind::Spect => self.spectrogram.render(&audio.to_mono()),
            _ => {
                let resampled;
                let audio = match self.config.encode.audmage_sample_rate {
                    Some(rate) if rate != audio.sample_rate => {
                        resampled = audio
                            .resampled(rate)
                            .map_err(|e| AudmageError::corrupt(path, &e))?;
                        &resampled
                    }
                    _ => audio,
                };
                let matrix = self.encoder.encode(&audio.to_waveform(), audio.sample_rate)?;
                Ok(matrix.to_image())
            }
        }
    }

    fn split(&self, layout: &Layout, skipped: &mut Vec<SkipRecord>) -> Result<SplitSummary> {
        let modes = &self.config.modes;
        let primary = choose_primary_kind(modes, layout)?;
        let companion = match primary {
            ArtifactKind::Spect if modes.audmage => Some(ArtifactKind::Audmage),
            ArtifactKind::Audmage if modes.spect => Some(ArtifactKind::Spect),
            _ => None,
        };

        let mut splitter = DatasetSplitter::new(layout.clone(), &self.config.dataset)?;
        splitter.split(primary, companion, skipped)
    }
}

/// Decode `path` into `slot` on first use
fn load_once<'a>(slot: &'a mut Option<AudioData>, path: &Path) -> Result<&'a AudioData> {
    let audio = match slot.take() {
        Some(audio) => audio,
        None => {
            if !path.exists() {
                return Err(AudmageError::MissingFile(path.to_path_buf()));
            }
            decode_audio(path).map_err(|e| AudmageError::corrupt(path, &e))?
        }
    };
    Ok(slot.insert(audio))
}

#[cfg(test)]
mod tests;
