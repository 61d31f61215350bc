//! Backups — point-in-time copies of single files and whole trees.
//!
//! File backups sit beside the original as `<name>.backup.<marker>`. The
//! marker is a millisecond timestamp that never repeats within a process and
//! is bumped past any file already on disk, so two backups of the same file
//! never collide.

mod tree;

pub use tree::{
    create_snapshot_dir, list_snapshots, prune_snapshots, restore_tree, snapshot_tree,
    PruneReport, RestoreReport, SnapshotInfo, SnapshotManifest, SnapshotReport, TreeError,
    TreeErrorKind, MANIFEST_FILE,
};

use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{Error, Result};

const BACKUP_INFIX: &str = ".backup.";

static LAST_MARKER: AtomicI64 = AtomicI64::new(0);

/// Current time in milliseconds, forced strictly above the last marker handed out.
fn next_marker() -> i64 {
    let now = Utc::now().timestamp_millis();
    let previous = LAST_MARKER
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(previous + 1)
}

fn backup_path_for(path: &Path, marker: i64) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}{}", name, BACKUP_INFIX, marker))
}

/// Whether `path` looks like a file backup produced by [`create_backup`].
pub fn is_backup_path(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .and_then(|name| {
            name.rsplit_once(BACKUP_INFIX)
                .map(|(_, marker)| !marker.is_empty() && marker.chars().all(|c| c.is_ascii_digit()))
        })
        .unwrap_or(false)
}

/// Copy `path` to a fresh sibling backup and return the backup's path.
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(Error::backup_failed(
            path.display().to_string(),
            "source is not a readable file",
        ));
    }

    let mut backup = backup_path_for(path, next_marker());
    while backup.exists() {
        backup = backup_path_for(path, next_marker());
    }

    fs::copy(path, &backup)
        .map_err(|e| Error::backup_failed(path.display().to_string(), e.to_string()))?;

    Ok(backup)
}

/// Overwrite `path` with the bytes of `backup`.
pub fn rollback(path: &Path, backup: &Path) -> Result<()> {
    if !backup.is_file() {
        return Err(Error::backup_not_found(
            path.display().to_string(),
            backup.display().to_string(),
        ));
    }

    fs::copy(backup, path).map(|_| ()).map_err(|e| {
        Error::rollback_failed(
            path.display().to_string(),
            backup.display().to_string(),
            e.to_string(),
        )
    })
}

/// A backup that could not be removed.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupError {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub total_backups: usize,
    pub removed_count: usize,
    pub errors: Vec<CleanupError>,
}

/// Delete backups, best effort. Missing files are recorded, never fatal.
pub fn cleanup_backups(paths: &[PathBuf]) -> CleanupReport {
    let mut report = CleanupReport {
        total_backups: paths.len(),
        removed_count: 0,
        errors: Vec::new(),
    };

    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => report.removed_count += 1,
            Err(e) => report.errors.push(CleanupError {
                path: path.clone(),
                error: e.to_string(),
            }),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_is_a_sibling_with_numeric_marker() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.js");
        fs::write(&file, "Original Resonance content").unwrap();

        let backup = create_backup(&file).unwrap();

        assert_eq!(backup.parent(), file.parent());
        assert!(is_backup_path(&backup));
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("test.js.backup."));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "Original Resonance content");
    }

    #[test]
    fn rapid_backups_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.json");
        fs::write(&file, "{}").unwrap();

        let paths: Vec<_> = (0..20).map(|_| create_backup(&file).unwrap()).collect();
        let unique: std::collections::HashSet<_> = paths.iter().collect();

        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn rollback_restores_bytes_after_modification() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.js");
        fs::write(&file, "Original Resonance content").unwrap();

        let backup = create_backup(&file).unwrap();
        fs::write(&file, "Modified Evoleotion content").unwrap();
        rollback(&file, &backup).unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "Original Resonance content");
    }

    #[test]
    fn rollback_fails_when_backup_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.js");
        fs::write(&file, "x").unwrap();

        let err = rollback(&file, &dir.path().join("test.js.backup.1")).unwrap_err();
        assert_eq!(err.code.as_str(), "backup.not_found");
    }

    #[test]
    fn backup_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_backup(&dir.path().join("missing.js")).unwrap_err();
        assert_eq!(err.code.as_str(), "backup.failed");
    }

    #[test]
    fn cleanup_continues_past_missing_backups() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.js");
        fs::write(&file, "x").unwrap();

        let first = create_backup(&file).unwrap();
        let missing = dir.path().join("nonexistent.backup");
        let second = create_backup(&file).unwrap();

        let report = cleanup_backups(&[first.clone(), missing.clone(), second.clone()]);

        assert_eq!(report.total_backups, 3);
        assert_eq!(report.removed_count, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, missing);
        assert!(!first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn is_backup_path_requires_digits() {
        assert!(is_backup_path(Path::new("a.js.backup.1729350000000")));
        assert!(!is_backup_path(Path::new("a.js.backup.")));
        assert!(!is_backup_path(Path::new("a.js.backup.old")));
        assert!(!is_backup_path(Path::new("a.js")));
    }
}
