//! # ops
//!
//! File operations against a bound share. These are stateless
//! pass-throughs: obtain a connector from the pool, borrow its share
//! handle, move the bytes.

use std::io::{Read, Write};

use remotefs::File;

use crate::client::{SmbShare, WriteMode};
use crate::error::SmbIoError;
use crate::path::SmbPath;

/// Read the remote file at `path` into `out`; returns the bytes copied.
pub fn read_file(
    share: &dyn SmbShare,
    path: &SmbPath,
    out: &mut (dyn Write + Send),
) -> Result<u64, SmbIoError> {
    trace!("reading {}", path);
    share
        .read_to(path.path(), out)
        .map_err(|e| SmbIoError::Read {
            path: path.to_string(),
            source: e,
        })
}

/// Write `input` to the remote file at `path` under `mode`; returns the
/// bytes copied.
pub fn write_file(
    share: &dyn SmbShare,
    path: &SmbPath,
    mode: WriteMode,
    input: &mut (dyn Read + Send),
) -> Result<u64, SmbIoError> {
    trace!("writing {} ({:?})", path, mode);
    share
        .write_from(path.path(), mode, input)
        .map_err(|e| SmbIoError::Write {
            path: path.to_string(),
            source: e,
        })
}

/// List the files in the directory at `dir`.
///
/// Directories are skipped, and so are hidden files; if they are hidden we
/// should not be processing them. `filter`, when given, is applied to the
/// file name.
pub fn list_dir(
    share: &dyn SmbShare,
    dir: &SmbPath,
    filter: Option<&(dyn Fn(&str) -> bool + Send + Sync)>,
) -> Result<Vec<File>, SmbIoError> {
    trace!("listing files at {}", dir);
    let entries = share.list_dir(dir.path()).map_err(|e| SmbIoError::List {
        path: dir.to_string(),
        source: e,
    })?;
    Ok(entries
        .into_iter()
        .filter(|f| !f.is_dir())
        .filter(|f| !f.name().starts_with('.'))
        .filter(|f| filter.map(|matches| matches(f.name().as_str())).unwrap_or(true))
        .collect())
}

/// Remove the remote file at `path`.
pub fn delete_file(share: &dyn SmbShare, path: &SmbPath) -> Result<(), SmbIoError> {
    trace!("removing file {}", path);
    share
        .remove_file(path.path())
        .map_err(|e| SmbIoError::Remove {
            path: path.to_string(),
            source: e,
        })
}

/// Remove the remote file at `path`, logging instead of failing. Used
/// after a consume-style read, where a leftover file must not fail the
/// operation that already succeeded.
pub fn delete_file_quietly(share: &dyn SmbShare, path: &SmbPath) {
    if let Err(e) = delete_file(share, path) {
        warn!("failed to delete [{}]: {}", path, e);
    }
}
