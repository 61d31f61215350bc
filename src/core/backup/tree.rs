//! Whole-tree snapshots: copy a project into a timestamped directory with a
//! manifest, restore all or part of it, list and prune old snapshots.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::io;

pub const MANIFEST_FILE: &str = "backup-manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeErrorKind {
    FileCopy,
    DirectoryRead,
    ManifestRead,
    ManifestWrite,
    FileRestore,
    InvalidPath,
    SnapshotRemove,
}

/// A per-entry failure. Snapshot and restore keep going after these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeError {
    #[serde(rename = "type")]
    pub kind: TreeErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub message: String,
}

impl TreeError {
    fn new(kind: TreeErrorKind, path: &Path, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: Some(path.to_path_buf()),
            message: message.into(),
        }
    }
}

/// Written as `backup-manifest.json` at the root of every snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotManifest {
    pub timestamp: String,
    pub source_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub files_backed_up: usize,
    #[serde(default)]
    pub excluded_dirs: Vec<String>,
    #[serde(default)]
    pub errors: Vec<TreeError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReport {
    pub backup_path: PathBuf,
    pub files_backed_up: usize,
    pub errors: Vec<TreeError>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub files_restored: usize,
    pub errors: Vec<TreeError>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub name: String,
    pub path: PathBuf,
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<SnapshotManifest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    pub kept: usize,
    pub removed: Vec<PathBuf>,
    pub errors: Vec<TreeError>,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Create `<base>/<prefix>-<timestamp>` and return it. The timestamp has
/// `:` and `.` replaced so the name is valid on every filesystem.
pub fn create_snapshot_dir(base: &Path, prefix: &str) -> Result<PathBuf> {
    let stamp = now_iso().replace([':', '.'], "-");
    let stem = format!("{}-{}", prefix, stamp);

    let mut dir = base.join(&stem);
    let mut n = 1;
    while dir.exists() {
        dir = base.join(format!("{}-{}", stem, n));
        n += 1;
    }

    io::create_dir_all(&dir, "create snapshot directory")?;
    Ok(dir)
}

struct TreeWalk<'a> {
    excluded_dirs: &'a [String],
    skip_files: &'a [&'a str],
    // Never descend into this directory (the snapshot itself, when nested in the source)
    guard: Option<PathBuf>,
    copied: usize,
    errors: Vec<TreeError>,
    copy_kind: TreeErrorKind,
}

impl TreeWalk<'_> {
    fn copy_dir(&mut self, from: &Path, to: &Path) {
        let entries = match fs::read_dir(from) {
            Ok(entries) => entries,
            Err(e) => {
                self.errors.push(TreeError::new(
                    TreeErrorKind::DirectoryRead,
                    from,
                    e.to_string(),
                ));
                return;
            }
        };

        let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let name = entry.file_name().to_string_lossy().to_string();
            let src = entry.path();
            let dst = to.join(&name);

            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                if self.excluded_dirs.iter().any(|d| d == &name) {
                    continue;
                }
                if let Some(guard) = &self.guard {
                    if fs::canonicalize(&src).ok().as_ref() == Some(guard) {
                        continue;
                    }
                }
                if let Err(e) = io::create_dir_all(&dst, "create snapshot subdirectory") {
                    self.errors.push(TreeError::new(
                        TreeErrorKind::DirectoryRead,
                        &dst,
                        e.to_string(),
                    ));
                    continue;
                }
                self.copy_dir(&src, &dst);
            } else {
                if self.skip_files.contains(&name.as_str()) {
                    continue;
                }
                match io::copy_file(&src, &dst, "copy file") {
                    Ok(_) => self.copied += 1,
                    Err(e) => self
                        .errors
                        .push(TreeError::new(self.copy_kind, &src, e.to_string())),
                }
            }
        }
    }
}

/// Copy every file under `source` into `dest`, skipping directories whose
/// name is in `excluded_dirs`, then write the manifest.
pub fn snapshot_tree(source: &Path, dest: &Path, excluded_dirs: &[String]) -> SnapshotReport {
    let mut walk = TreeWalk {
        excluded_dirs,
        skip_files: &[],
        guard: None,
        copied: 0,
        errors: Vec::new(),
        copy_kind: TreeErrorKind::FileCopy,
    };

    if let Err(e) = io::create_dir_all(dest, "create snapshot directory") {
        walk.errors.push(TreeError::new(
            TreeErrorKind::DirectoryRead,
            dest,
            e.to_string(),
        ));
        return SnapshotReport {
            backup_path: dest.to_path_buf(),
            files_backed_up: 0,
            errors: walk.errors,
            success: false,
        };
    }
    walk.guard = fs::canonicalize(dest).ok();

    log_status!("backup", "Snapshotting {} -> {}", source.display(), dest.display());
    walk.copy_dir(source, dest);

    let manifest = SnapshotManifest {
        timestamp: now_iso(),
        source_dir: fs::canonicalize(source).unwrap_or_else(|_| source.to_path_buf()),
        backup_dir: fs::canonicalize(dest).unwrap_or_else(|_| dest.to_path_buf()),
        files_backed_up: walk.copied,
        excluded_dirs: excluded_dirs.to_vec(),
        errors: walk.errors.clone(),
    };

    let mut errors = walk.errors;
    let written = serde_json::to_string_pretty(&manifest)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize manifest".to_string())))
        .and_then(|json| io::write_file_atomic(&dest.join(MANIFEST_FILE), &json, "write manifest"));
    if let Err(e) = written {
        errors.push(TreeError::new(
            TreeErrorKind::ManifestWrite,
            &dest.join(MANIFEST_FILE),
            e.to_string(),
        ));
    }

    log_status!(
        "backup",
        "Snapshot complete: {} files, {} errors",
        manifest.files_backed_up,
        errors.len()
    );

    SnapshotReport {
        backup_path: dest.to_path_buf(),
        files_backed_up: manifest.files_backed_up,
        success: errors.is_empty(),
        errors,
    }
}

fn read_manifest(backup_dir: &Path) -> Result<SnapshotManifest> {
    let path = backup_dir.join(MANIFEST_FILE);
    let content = io::read_file(&path, "read manifest")?;
    serde_json::from_str(&content)
        .map_err(|e| Error::internal_json(e.to_string(), Some(format!("parse {}", path.display()))))
}

/// Relative paths only, and none that climb out of the target.
fn is_contained(rel: &Path) -> bool {
    !rel.as_os_str().is_empty()
        && rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Copy a snapshot back over `target`. With `files`, only those relative
/// paths are restored; otherwise the whole snapshot is, minus its manifest.
pub fn restore_tree(backup_dir: &Path, target: &Path, files: Option<&[PathBuf]>) -> RestoreReport {
    let mut errors = Vec::new();

    if let Err(e) = read_manifest(backup_dir) {
        errors.push(TreeError::new(
            TreeErrorKind::ManifestRead,
            &backup_dir.join(MANIFEST_FILE),
            format!("Could not read backup manifest: {}", e),
        ));
    }

    let mut restored = 0;
    match files {
        Some(files) => {
            for rel in files {
                if !is_contained(rel) {
                    errors.push(TreeError::new(
                        TreeErrorKind::InvalidPath,
                        rel,
                        "restore paths must be relative to the snapshot root",
                    ));
                    continue;
                }
                let src = backup_dir.join(rel);
                if !src.is_file() {
                    errors.push(TreeError::new(
                        TreeErrorKind::FileRestore,
                        rel,
                        "file not present in snapshot",
                    ));
                    continue;
                }
                match io::copy_file(&src, &target.join(rel), "restore file") {
                    Ok(_) => restored += 1,
                    Err(e) => errors.push(TreeError::new(
                        TreeErrorKind::FileRestore,
                        rel,
                        e.to_string(),
                    )),
                }
            }
        }
        None => {
            let mut walk = TreeWalk {
                excluded_dirs: &[],
                skip_files: &[MANIFEST_FILE],
                guard: None,
                copied: 0,
                errors: Vec::new(),
                copy_kind: TreeErrorKind::FileRestore,
            };
            walk.copy_dir(backup_dir, target);
            restored = walk.copied;
            errors.extend(walk.errors);
        }
    }

    log_status!("backup", "Restored {} files from {}", restored, backup_dir.display());

    RestoreReport {
        files_restored: restored,
        success: errors.is_empty(),
        errors,
    }
}

/// Snapshots under `base` whose name starts with `<prefix>-`, newest first.
pub fn list_snapshots(base: &Path, prefix: &str) -> Vec<SnapshotInfo> {
    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(e) => {
            log_status!("backup", "Cannot list {}: {}", base.display(), e);
            return Vec::new();
        }
    };

    let lead = format!("{}-", prefix);
    let mut snapshots: Vec<SnapshotInfo> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            if !name.starts_with(&lead) {
                return None;
            }
            let path = e.path();
            let created = e
                .metadata()
                .ok()
                .and_then(|m| m.created().or_else(|_| m.modified()).ok())
                .map(DateTime::<Utc>::from);
            let manifest = read_manifest(&path).ok();
            Some(SnapshotInfo {
                name,
                path,
                created,
                manifest,
            })
        })
        .collect();

    // Names embed the creation timestamp, so they break ties in filesystem time
    snapshots.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
    snapshots
}

/// Keep the newest `keep` snapshots and delete the rest.
pub fn prune_snapshots(base: &Path, prefix: &str, keep: usize) -> PruneReport {
    let snapshots = list_snapshots(base, prefix);
    let mut report = PruneReport {
        kept: snapshots.len().min(keep),
        removed: Vec::new(),
        errors: Vec::new(),
    };

    for snapshot in snapshots.into_iter().skip(keep) {
        match fs::remove_dir_all(&snapshot.path) {
            Ok(()) => {
                log_status!("backup", "Removed old snapshot {}", snapshot.name);
                report.removed.push(snapshot.path);
            }
            Err(e) => report.errors.push(TreeError::new(
                TreeErrorKind::SnapshotRemove,
                &snapshot.path,
                e.to_string(),
            )),
        }
    }

    report
}
