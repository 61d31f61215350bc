use clap::{Args, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use rebrander::backup::{self, CleanupReport, PruneReport, RestoreReport, SnapshotInfo, SnapshotReport};
use rebrander::rebrand::snapshot_base;
use rebrander::Error;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    command: BackupCommand,
}

#[derive(Subcommand)]
enum BackupCommand {
    /// Copy a file to a sibling `<name>.backup.<marker>`
    Create {
        file: PathBuf,
    },
    /// Overwrite a file with one of its backups
    Rollback {
        file: PathBuf,
        backup: PathBuf,
    },
    /// Delete file backups. Directories expand to the backups they contain.
    Cleanup {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Copy a whole tree into a new snapshot directory
    Snapshot {
        #[arg(default_value = ".")]
        root: PathBuf,
    },
    /// Copy a snapshot back over a tree
    Restore {
        snapshot: PathBuf,
        #[arg(default_value = ".")]
        target: PathBuf,
        /// Restore only this path, relative to the snapshot root (repeatable)
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,
    },
    /// List snapshots, newest first
    List {
        #[arg(default_value = ".")]
        root: PathBuf,
    },
    /// Delete all but the newest snapshots
    Prune {
        #[arg(default_value = ".")]
        root: PathBuf,
        /// How many to keep (default: backup.keep from config)
        #[arg(long)]
        keep: Option<usize>,
    },
}

#[derive(Serialize)]
pub struct CreateOutput {
    pub file: PathBuf,
    pub backup: PathBuf,
}

#[derive(Serialize)]
pub struct RollbackOutput {
    pub file: PathBuf,
    pub backup: PathBuf,
    pub restored: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum BackupOutput {
    Create(CreateOutput),
    Rollback(RollbackOutput),
    Cleanup(CleanupReport),
    Snapshot(SnapshotReport),
    Restore(RestoreReport),
    List(Vec<SnapshotInfo>),
    Prune(PruneReport),
}

pub fn run(args: BackupArgs, global: &GlobalArgs) -> CmdResult<BackupOutput> {
    match args.command {
        BackupCommand::Create { file } => {
            let backup = backup::create_backup(&file)?;
            Ok((BackupOutput::Create(CreateOutput { file, backup }), 0))
        }
        BackupCommand::Rollback { file, backup } => {
            backup::rollback(&file, &backup)?;
            Ok((
                BackupOutput::Rollback(RollbackOutput {
                    file,
                    backup,
                    restored: true,
                }),
                0,
            ))
        }
        BackupCommand::Cleanup { paths } => {
            let mut backups = Vec::new();
            for path in paths {
                if path.is_dir() {
                    backups.extend(backups_in(&path)?);
                } else {
                    backups.push(path);
                }
            }
            let report = backup::cleanup_backups(&backups);
            let exit_code = if report.errors.is_empty() { 0 } else { 1 };
            Ok((BackupOutput::Cleanup(report), exit_code))
        }
        BackupCommand::Snapshot { root } => {
            let config = global.load_config()?;
            let dest = backup::create_snapshot_dir(&snapshot_base(&config, &root), &config.backup.prefix)?;
            let report = backup::snapshot_tree(&root, &dest, &config.backup.exclude_dirs);
            let exit_code = if report.success { 0 } else { 1 };
            Ok((BackupOutput::Snapshot(report), exit_code))
        }
        BackupCommand::Restore {
            snapshot,
            target,
            files,
        } => {
            if !snapshot.is_dir() {
                return Err(Error::backup_not_found(
                    target.display().to_string(),
                    snapshot.display().to_string(),
                ));
            }
            let subset = if files.is_empty() {
                None
            } else {
                Some(files.as_slice())
            };
            let report = backup::restore_tree(&snapshot, &target, subset);
            let exit_code = if report.success { 0 } else { 1 };
            Ok((BackupOutput::Restore(report), exit_code))
        }
        BackupCommand::List { root } => {
            let config = global.load_config()?;
            let snapshots = backup::list_snapshots(&snapshot_base(&config, &root), &config.backup.prefix);
            Ok((BackupOutput::List(snapshots), 0))
        }
        BackupCommand::Prune { root, keep } => {
            let config = global.load_config()?;
            let report = backup::prune_snapshots(
                &snapshot_base(&config, &root),
                &config.backup.prefix,
                keep.unwrap_or(config.backup.keep),
            );
            let exit_code = if report.errors.is_empty() { 0 } else { 1 };
            Ok((BackupOutput::Prune(report), exit_code))
        }
    }
}

/// File backups directly inside `dir`, sorted by name.
fn backups_in(dir: &Path) -> rebrander::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", dir.display()))))?;

    let mut backups: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && backup::is_backup_path(p))
        .collect();
    backups.sort();
    Ok(backups)
}
