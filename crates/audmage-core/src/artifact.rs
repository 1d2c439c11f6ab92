//! Write-once image artifacts

use crate::error::Result;
use image::{ImageFormat, RgbImage};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Written,
    AlreadyExists,
}

/// Write a PNG to `dest` unless something is already there.
///
/// `render` only runs when the artifact is missing. The image goes to a
/// sibling temporary file first and is renamed into place, so a reader
/// never sees a half-written PNG.
pub fn write_if_absent<F>(dest: &Path, render: F) -> Result<WriteStatus>
where
    F: FnOnce() -> Result<RgbImage>,
{
    if dest.exists() {
        return Ok(WriteStatus::AlreadyExists);
    }

    let image = render()?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = dest.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    if let Err(e) = image.save_with_format(tmp, ImageFormat::Png) {
        let _ = std::fs::remove_file(tmp);
        return Err(e.into());
    }
    std::fs::rename(tmp, dest)?;

    Ok(WriteStatus::Written)
}
