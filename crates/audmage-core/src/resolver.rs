//! Genre resolution: metadata index first, embedded tag second

use crate::error::{AudmageError, Result};
use crate::index::MetadataIndex;
use crate::tags::TagStore;
use audmage_meta::{GenreLabel, TrackId};
use std::path::Path;
use std::sync::Arc;

pub struct GenreResolver<'a> {
    index: &'a MetadataIndex,
    tags: Arc<dyn TagStore>,
    retag: bool,
}

impl<'a> GenreResolver<'a> {
    /// With `retag` set the embedded tag is always read and rewritten when
    /// it disagrees with the index.
    pub fn new(index: &'a MetadataIndex, tags: Arc<dyn TagStore>, retag: bool) -> Self {
        Self { index, tags, retag }
    }

    pub fn resolve(&self, path: &Path) -> Result<GenreLabel> {
        let indexed = TrackId::from_path(path).and_then(|id| self.index.get(&id));

        if let Some(genre) = indexed {
            if !self.retag {
                return Ok(genre.clone());
            }
        }

        let tagged = match self.tags.read_genre(path) {
            Ok(raw) => raw.as_deref().and_then(GenreLabel::normalize),
            Err(e) => {
                log::debug!("{}", e);
                None
            }
        };

        match (indexed, tagged) {
            (Some(genre), tagged) => {
                if tagged.as_ref() != Some(genre) {
                    self.retag_file(path, genre, tagged.as_ref());
                }
                Ok(genre.clone())
            }
            (None, Some(genre)) => {
                log::debug!("Genre for {} taken from its tag: {}", path.display(), genre);
                Ok(genre)
            }
            (None, None) => Err(AudmageError::GenreNotFound(path.to_path_buf())),
        }
    }

    fn retag_file(&self, path: &Path, genre: &GenreLabel, previous: Option<&GenreLabel>) {
        match self.tags.write_genre(path, genre.as_str()) {
            Ok(()) => log::info!(
                "Retagged {}: {} -> {}",
                path.display(),
                previous.map(GenreLabel::as_str).unwrap_or("<none>"),
                genre
            ),
            Err(e) => log::warn!("Could not retag {}: {}", path.display(), e),
        }
    }
}
