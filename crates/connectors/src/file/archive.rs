//! Gzip tar archival of a finished export file.
//!
//! - One entry per archive, named after the source file's base name
//! - Archive is fsynced before returning, so the caller may remove the source
//! - The source file itself is never modified

use crate::file::csv::error::FileError;
use flate2::{Compression, write::GzEncoder};
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, ErrorKind},
    path::Path,
};
use tar::Builder;
use tracing::debug;

/// Writes `dst` as a gzip tar holding `src` under its base name.
///
/// Returns the size of the archive in bytes.
pub fn archive_file(src: &Path, dst: &Path) -> Result<u64, FileError> {
    let entry_name = src
        .file_name()
        .ok_or_else(|| FileError::InvalidPath(src.to_path_buf()))?;

    let mut input = File::open(src).map_err(|e| FileError::io(src, e))?;
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dst)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => FileError::AlreadyExists(dst.to_path_buf()),
            _ => FileError::io(dst, e),
        })?;

    let encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    let mut builder = Builder::new(encoder);

    builder
        .append_file(entry_name, &mut input)
        .map_err(|e| FileError::io(dst, e))?;

    let encoder = builder.into_inner().map_err(|e| FileError::io(dst, e))?;
    let writer = encoder.finish().map_err(|e| FileError::io(dst, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| FileError::io(dst, e.into_error()))?;
    file.sync_all().map_err(|e| FileError::io(dst, e))?;

    let size = file.metadata().map_err(|e| FileError::io(dst, e))?.len();
    debug!(src = %src.display(), dst = %dst.display(), size, "Archive written");
    Ok(size)
}
