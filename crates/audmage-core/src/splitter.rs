//! Random train/test/validate partition of the sorted image sets

use crate::config::{DatasetConfig, ModeConfig};
use crate::error::{AudmageError, Result};
use crate::layout::{ArtifactKind, Layout, Subset};
use crate::report::{SkipRecord, Stage};
use audmage_meta::GenreLabel;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Subset fractions of one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub test: f64,
    pub validate: f64,
}

impl SplitRatios {
    pub fn from_config(config: &DatasetConfig) -> Result<Self> {
        let [train, test, validate] = config.fractions()?;
        Ok(Self {
            train,
            test,
            validate,
        })
    }

    /// Sizes of the train, test and validate subsets for `n` items.
    /// Truncation leftovers land in validate.
    pub fn counts(&self, n: usize) -> [usize; 3] {
        let total = n as f64;
        let train = ((total * self.train).floor() as usize).min(n);
        let test_end = ((total * self.train + total * self.test).floor() as usize).clamp(train, n);
        [train, test_end - train, n - test_end]
    }
}

/// Shuffle `items` and cut them into train, test and validate
pub fn partition<T, R: Rng + ?Sized>(mut items: Vec<T>, ratios: &SplitRatios, rng: &mut R) -> [Vec<T>; 3] {
    items.shuffle(rng);
    let [train, test, _] = ratios.counts(items.len());
    let mut rest = items.split_off(train);
    let validate = rest.split_off(test);
    [items, rest, validate]
}

/// Image set the split is driven by: spectrograms when they exist,
/// otherwise audmages
pub fn choose_primary_kind(modes: &ModeConfig, layout: &Layout) -> Result<ArtifactKind> {
    [(modes.spect, ArtifactKind::Spect), (modes.audmage, ArtifactKind::Audmage)]
        .into_iter()
        .find(|(enabled, kind)| *enabled && layout.sorted_root(*kind).is_dir())
        .map(|(_, kind)| kind)
        .ok_or_else(|| AudmageError::config("no image set was chosen"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    pub genres: usize,
    pub train: usize,
    pub test: usize,
    pub validate: usize,
    /// Copies of the other image kind placed alongside
    pub companions: usize,
}

impl SplitSummary {
    fn add(&mut self, subset: Subset) {
        match subset {
            Subset::Train => self.train += 1,
            Subset::Test => self.test += 1,
            Subset::Validate => self.validate += 1,
        }
    }
}

pub struct DatasetSplitter {
    layout: Layout,
    ratios: SplitRatios,
    rng: ChaCha8Rng,
}

impl DatasetSplitter {
    pub fn new(layout: Layout, config: &DatasetConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Ok(Self {
            layout,
            ratios: SplitRatios::from_config(config)?,
            rng,
        })
    }

    /// Copy every sorted `primary` image into its dataset subset.
    ///
    /// Each genre is shuffled and cut independently. When `companion` is
    /// given, the same-named image of that kind follows into the matching
    /// subset if it exists.
    pub fn split(
        &mut self,
        primary: ArtifactKind,
        companion: Option<ArtifactKind>,
        skipped: &mut Vec<SkipRecord>,
    ) -> Result<SplitSummary> {
        let mut summary = SplitSummary::default();

        for genre in list_genres(&self.layout.sorted_root(primary))? {
            let files = list_files(&self.layout.sorted_dir(primary, &genre))?;
            let subsets = partition(files, &self.ratios, &mut self.rng);
            summary.genres += 1;

            for (subset, files) in Subset::ALL.into_iter().zip(subsets) {
                log::debug!("{} {}: {} files", genre, subset.dir_name(), files.len());
                for file in files {
                    match self.place(primary, subset, &genre, &file) {
                        Ok(()) => summary.add(subset),
                        Err(e) => {
                            skipped.push(SkipRecord::new(&file, Stage::Dataset, &e));
                            continue;
                        }
                    }

                    if let Some(other) = companion {
                        let sibling = self.layout.sorted_dir(other, &genre).join(file_name(&file));
                        if sibling.is_file() {
                            match self.place(other, subset, &genre, &sibling) {
                                Ok(()) => summary.companions += 1,
                                Err(e) => skipped.push(SkipRecord::new(&sibling, Stage::Dataset, &e)),
                            }
                        }
                    }
                }
            }
        }

        log::info!(
            "Dataset from {}: {} train, {} test, {} validate over {} genres",
            primary,
            summary.train,
            summary.test,
            summary.validate,
            summary.genres
        );
        Ok(summary)
    }

    fn place(&self, kind: ArtifactKind, subset: Subset, genre: &GenreLabel, src: &Path) -> Result<()> {
        let dest_dir = self.layout.dataset_dir(kind, subset, genre);
        fs::create_dir_all(&dest_dir)?;
        fs::copy(src, dest_dir.join(file_name(src)))?;
        Ok(())
    }
}

fn file_name(path: &Path) -> &std::ffi::OsStr {
    path.file_name().unwrap_or(path.as_os_str())
}

fn list_genres(root: &Path) -> Result<Vec<GenreLabel>> {
    let mut genres = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(genre) = entry.file_name().to_str().and_then(GenreLabel::normalize) {
                genres.push(genre);
            }
        }
    }
    genres.sort();
    Ok(genres)
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ratios(train: f64, test: f64, validate: f64) -> SplitRatios {
        SplitRatios {
            train,
            test,
            validate,
        }
    }

    #[test]
    fn test_partition_hundred_items() {
        let items: Vec<u32> = (0..100).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let [train, test, validate] = partition(items, &ratios(0.8, 0.1, 0.1), &mut rng);

        assert!((79..=81).contains(&train.len()));
        assert!((9..=11).contains(&test.len()));
        assert!((9..=11).contains(&validate.len()));

        let all: HashSet<u32> = train.iter().chain(&test).chain(&validate).copied().collect();
        assert_eq!(all.len(), 100);
        assert_eq!(all, (0..100).collect::<HashSet<u32>>());
    }

    #[test]
    fn test_partition_is_seeded() {
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            partition((0..50).collect::<Vec<u32>>(), &ratios(0.6, 0.2, 0.2), &mut rng)
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_counts() {
        let r = ratios(0.8, 0.1, 0.1);
        assert_eq!(r.counts(0), [0, 0, 0]);
        assert_eq!(r.counts(1), [0, 0, 1]);
        assert_eq!(r.counts(10).iter().sum::<usize>(), 10);
        assert_eq!(ratios(1.0, 0.0, 0.0).counts(7), [7, 0, 0]);
    }

    #[test]
    fn test_choose_primary_kind() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let mut modes = ModeConfig {
            spect: true,
            audmage: true,
            ..ModeConfig::default()
        };

        assert!(matches!(
            choose_primary_kind(&modes, &layout),
            Err(AudmageError::Configuration(_))
        ));

        fs::create_dir_all(layout.sorted_root(ArtifactKind::Audmage)).unwrap();
        assert_eq!(choose_primary_kind(&modes, &layout).unwrap(), ArtifactKind::Audmage);

        fs::create_dir_all(layout.sorted_root(ArtifactKind::Spect)).unwrap();
        assert_eq!(choose_primary_kind(&modes, &layout).unwrap(), ArtifactKind::Spect);

        modes.spect = false;
        assert_eq!(choose_primary_kind(&modes, &layout).unwrap(), ArtifactKind::Audmage);
    }

    #[test]
    fn test_split_copies_with_companions() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let rock = GenreLabel::normalize("Rock").unwrap();

        let spect = layout.ensure_sorted_dir(ArtifactKind::Spect, &rock).unwrap();
        let audmage = layout.ensure_sorted_dir(ArtifactKind::Audmage, &rock).unwrap();
        for i in 0..10 {
            fs::write(spect.join(format!("{:05}.png", i)), b"s").unwrap();
            fs::write(audmage.join(format!("{:05}.png", i)), b"a").unwrap();
        }

        let config = DatasetConfig {
            seed: Some(1),
            ..DatasetConfig::default()
        };
        let mut splitter = DatasetSplitter::new(layout.clone(), &config).unwrap();
        let mut skipped = Vec::new();
        let summary = splitter
            .split(ArtifactKind::Spect, Some(ArtifactKind::Audmage), &mut skipped)
            .unwrap();

        assert!(skipped.is_empty());
        assert_eq!(summary.genres, 1);
        assert_eq!([summary.train, summary.test, summary.validate], [8, 1, 1]);
        assert_eq!(summary.companions, 10);

        for subset in Subset::ALL {
            let spect_files = list_files(&layout.dataset_dir(ArtifactKind::Spect, subset, &rock)).unwrap();
            let audmage_files = list_files(&layout.dataset_dir(ArtifactKind::Audmage, subset, &rock)).unwrap();
            let names = |files: &[PathBuf]| -> Vec<_> {
                files.iter().map(|f| f.file_name().unwrap().to_owned()).collect()
            };
            assert_eq!(names(&spect_files), names(&audmage_files));
        }
    }

    #[test]
    fn test_invalid_ratios() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatasetConfig {
            train: 0.5,
            test: 0.1,
            validate: 0.1,
            seed: Some(1),
        };
        assert!(DatasetSplitter::new(Layout::new(dir.path()), &config).is_err());
    }
}
