//! Delta package reader
//!
//! Maps a static-delta package read-only and decodes its superblock.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::domain::services::DeltaSuperblock;
use crate::error::{OtaError, OtaResult};

/// Decode the superblock of the package at `path`.
///
/// An unreadable file is reported the same way as a malformed one: either
/// way there is nothing that can be applied.
pub fn read_superblock(path: &Path) -> OtaResult<DeltaSuperblock> {
    let unreadable = |e: std::io::Error| OtaError::MalformedDelta {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let file = File::open(path).map_err(unreadable)?;
    // SAFETY: the map is read-only and dropped before this function returns;
    // the decoder copies out everything it keeps.
    let map = unsafe { Mmap::map(&file) }.map_err(unreadable)?;
    debug!(path = %path.display(), size = map.len(), "mapped delta package");

    DeltaSuperblock::parse(&map).map_err(|e| OtaError::malformed_delta(path, e))
}
