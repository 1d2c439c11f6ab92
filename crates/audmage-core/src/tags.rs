//! Embedded genre tags
//!
//! The resolver only needs two operations on a file's tag, so they sit
//! behind [`TagStore`]. [`Id3TagStore`] is the production backend.

use crate::error::{AudmageError, Result};
use id3::{ErrorKind, Tag, TagLike, Version};
use std::path::Path;

pub trait TagStore: Send + Sync {
    /// Raw genre text of the file's tag, `None` when there is no tag or
    /// no genre frame
    fn read_genre(&self, path: &Path) -> Result<Option<String>>;

    /// Replace the genre, creating the tag if needed
    fn write_genre(&self, path: &Path, genre: &str) -> Result<()>;
}

/// ID3v2 tags via the `id3` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3TagStore;

impl Id3TagStore {
    pub fn new() -> Self {
        Self
    }

    fn read_tag(path: &Path) -> Result<Option<Tag>> {
        match Tag::read_from_path(path) {
            Ok(tag) => Ok(Some(tag)),
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => Ok(None),
            Err(e) => Err(tag_error(path, e)),
        }
    }
}

impl TagStore for Id3TagStore {
    fn read_genre(&self, path: &Path) -> Result<Option<String>> {
        let genre = Self::read_tag(path)?
            .and_then(|tag| tag.genre_parsed().map(|g| g.into_owned()));
        log::debug!("Tag genre of {}: {:?}", path.display(), genre);
        Ok(genre)
    }

    fn write_genre(&self, path: &Path, genre: &str) -> Result<()> {
        let mut tag = Self::read_tag(path)?.unwrap_or_default();
        tag.set_genre(genre);
        tag.write_to_path(path, Version::Id3v24)
            .map_err(|e| tag_error(path, e))
    }
}

fn tag_error(path: &Path, err: id3::Error) -> AudmageError {
    AudmageError::Tag {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_file_has_no_genre() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("00007.mp3");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        assert_eq!(Id3TagStore::new().read_genre(&path).unwrap(), None);
    }

    #[test]
    fn test_write_then_read_genre() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("00007.mp3");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let store = Id3TagStore::new();
        store.write_genre(&path, "Folk").unwrap();
        assert_eq!(store.read_genre(&path).unwrap().as_deref(), Some("Folk"));

        store.write_genre(&path, "Old-Time_-_Historic").unwrap();
        assert_eq!(
            store.read_genre(&path).unwrap().as_deref(),
            Some("Old-Time_-_Historic")
        );
    }

    #[test]
    fn test_missing_file_is_tag_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Id3TagStore::new()
            .read_genre(&dir.path().join("gone.mp3"))
            .unwrap_err();
        assert!(matches!(err, AudmageError::Tag { .. }));
    }
}
