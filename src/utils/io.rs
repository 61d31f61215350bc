//! Filesystem helpers used by the scanner, batch writer and snapshots.
//!
//! Every failure becomes `Error::internal_io` whose context names both the
//! operation and the path, so per-file reports say which file broke.

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;

fn io_error(err: io::Error, operation: &str, path: &Path) -> Error {
    Error::internal_io(
        err.to_string(),
        Some(format!("{}: {}", operation, path.display())),
    )
}

pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| io_error(e, operation, path))
}

pub fn write_file(path: &Path, content: &str, operation: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| io_error(e, operation, path))
}

/// Write through a `<name>.tmp` sibling and rename it over `path`.
///
/// A crash mid-write leaves the old file in place.
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Err(Error::internal_io(
            "path has no parent or file name",
            Some(format!("{}: {}", operation, path.display())),
        ));
    };

    let tmp = parent.join(format!("{}.tmp", name.to_string_lossy()));
    fs::write(&tmp, content).map_err(|e| io_error(e, operation, &tmp))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_error(e, operation, path)
    })
}

/// Copy bytes from `from` to `to`, creating `to`'s parents first.
pub fn copy_file(from: &Path, to: &Path, operation: &str) -> Result<u64> {
    match to.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir_all(parent, operation)?,
        _ => {}
    }
    fs::copy(from, to).map_err(|e| io_error(e, operation, from))
}

pub fn create_dir_all(path: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| io_error(e, operation, path))
}
