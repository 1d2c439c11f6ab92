//! Audmage genre lookup formats
//!
//! Value types plus readers and writers for the flat-file genre cache and
//! the positional metadata table it is built from.

pub mod format;
pub mod reader;
pub mod writer;

pub use format::{
    CacheRecord, GenreLabel, MetadataRow, TrackId, DEFAULT_SUBSETS, GENRE_COLUMN, SUBSET_COLUMN,
    TRACK_ID_COLUMN,
};
pub use reader::{CacheReader, MetadataReader};
pub use writer::CacheWriter;
