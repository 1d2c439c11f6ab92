//! Output directory layout and audio relocation
//!
//! ```text
//! <root>/sorted/<kind>/<genre>/<file>
//! <root>/dataset/<kind>/<subset>/<genre>/<file>
//! ```

use crate::error::{AudmageError, Result};
use audmage_meta::GenreLabel;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const SORTED_DIR: &str = "sorted";
pub const DATASET_DIR: &str = "dataset";

/// Extension of every image artifact
pub const IMAGE_EXTENSION: &str = "png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Audio,
    Spect,
    Audmage,
}

impl ArtifactKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "audio",
            ArtifactKind::Spect => "spect",
            ArtifactKind::Audmage => "audmage",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subset {
    Train,
    Test,
    Validate,
}

impl Subset {
    pub const ALL: [Subset; 3] = [Subset::Train, Subset::Test, Subset::Validate];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Subset::Train => "train",
            Subset::Test => "test",
            Subset::Validate => "validate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `sorted/<kind>`
    pub fn sorted_root(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(SORTED_DIR).join(kind.dir_name())
    }

    /// `sorted/<kind>/<genre>`
    pub fn sorted_dir(&self, kind: ArtifactKind, genre: &GenreLabel) -> PathBuf {
        self.sorted_root(kind).join(genre.as_str())
    }

    /// `dataset/<kind>/<subset>/<genre>`
    pub fn dataset_dir(&self, kind: ArtifactKind, subset: Subset, genre: &GenreLabel) -> PathBuf {
        self.root
            .join(DATASET_DIR)
            .join(kind.dir_name())
            .join(subset.dir_name())
            .join(genre.as_str())
    }

    /// Destination image for an audio file: `sorted/<kind>/<genre>/<stem>.png`
    pub fn artifact_path(&self, kind: ArtifactKind, genre: &GenreLabel, audio: &Path) -> Result<PathBuf> {
        let stem = audio
            .file_stem()
            .ok_or_else(|| AudmageError::MissingFile(audio.to_path_buf()))?;
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(IMAGE_EXTENSION);
        Ok(self.sorted_dir(kind, genre).join(name))
    }

    pub fn ensure_sorted_dir(&self, kind: ArtifactKind, genre: &GenreLabel) -> Result<PathBuf> {
        let dir = self.sorted_dir(kind, genre);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Create the sorted tree, and the dataset tree when asked, for one
    /// genre and every listed kind. Safe to repeat.
    pub fn ensure_genre_dirs(&self, genre: &GenreLabel, kinds: &[ArtifactKind], dataset: bool) -> Result<()> {
        for &kind in kinds {
            self.ensure_sorted_dir(kind, genre)?;
            if dataset && kind != ArtifactKind::Audio {
                for subset in Subset::ALL {
                    fs::create_dir_all(self.dataset_dir(kind, subset, genre))?;
                }
            }
        }
        Ok(())
    }
}

/// Move or copy `src` into `dest_dir`, keeping its file name.
///
/// A move tries `rename` first and falls back to copy + remove, so it
/// also works across filesystems. Relocating a file onto itself does
/// nothing. An identical file already at the destination counts as done
/// (a move then just drops the source); a different one is never
/// replaced.
pub fn relocate(src: &Path, dest_dir: &Path, copy: bool) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| AudmageError::MissingFile(src.to_path_buf()))?;
    if !src.exists() {
        return Err(AudmageError::MissingFile(src.to_path_buf()));
    }

    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(name);

    if same_file(src, &dest) {
        return Ok(dest);
    }
    if dest.exists() {
        if !same_contents(src, &dest)? {
            return Err(AudmageError::DestinationExists {
                src: src.to_path_buf(),
                dest,
            });
        }
        log::debug!("{} already sorted", dest.display());
        if !copy {
            fs::remove_file(src)?;
        }
        return Ok(dest);
    }

    if copy {
        fs::copy(src, &dest)?;
    } else if let Err(e) = fs::rename(src, &dest) {
        log::debug!("rename {} failed ({}), copying instead", src.display(), e);
        fs::copy(src, &dest)?;
        fs::remove_file(src)?;
    }

    Ok(dest)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn same_contents(a: &Path, b: &Path) -> Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(fs::read(a)? == fs::read(b)?)
}
