//! End-to-end rebrand and dry run over a project tree.

use std::path::{Path, PathBuf};

use crate::backup;
use crate::batch::{batch_replace, BatchOptions, FileDescriptor};
use crate::defaults::RebrandConfig;
use crate::error::{Error, Result};
use crate::output::{DryRunReport, FileDetail, RebrandReport};
use crate::replace::Replacer;
use crate::scanner::{summarize, ContextLabel, ScanResult, Scanner};

const SAMPLE_MATCHES: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct RebrandOptions {
    pub batch: BatchOptions,
    /// Copy the whole tree under the configured backup dir before rewriting.
    pub snapshot: bool,
}

/// Pick one context for a whole file.
///
/// JSON files are always config. Otherwise the highest-ranked context seen
/// in the file wins: metadata, then config, then content.
pub fn determine_file_context(result: &ScanResult) -> ContextLabel {
    if result.file_extension == "json" {
        return ContextLabel::Config;
    }

    [
        ContextLabel::Metadata,
        ContextLabel::Config,
        ContextLabel::Content,
    ]
    .into_iter()
    .find(|label| result.contexts.contains(label))
    .unwrap_or(ContextLabel::General)
}

/// Snapshot base dir, resolved against `root` when relative.
pub fn snapshot_base(config: &RebrandConfig, root: &Path) -> PathBuf {
    if config.backup.base_dir.is_absolute() {
        config.backup.base_dir.clone()
    } else {
        root.join(&config.backup.base_dir)
    }
}

/// Scanner for a rebrand run. Snapshots kept inside the tree are never
/// scanned, whatever the configured exclusions say.
fn tree_scanner(config: &RebrandConfig) -> Result<Scanner> {
    let mut scan = config.scan.clone();
    if let Some(name) = config.backup.base_dir.file_name() {
        let name = name.to_string_lossy().to_string();
        if !scan.exclude_dirs.contains(&name) {
            scan.exclude_dirs.push(name);
        }
    }
    Scanner::new(&config.brand.from, &scan)
}

/// Scan `root`, rewrite every file with a match, and summarize.
pub fn rebrand_tree(
    config: &RebrandConfig,
    root: &Path,
    options: RebrandOptions,
) -> Result<RebrandReport> {
    let scanner = tree_scanner(config)?;
    let replacer = Replacer::new(config)?;

    let snapshot = if options.snapshot {
        let dest = backup::create_snapshot_dir(&snapshot_base(config, root), &config.backup.prefix)?;
        let report = backup::snapshot_tree(root, &dest, &config.backup.exclude_dirs);
        if !report.success {
            return Err(Error::backup_failed(
                root.display().to_string(),
                format!(
                    "snapshot to {} had {} errors",
                    dest.display(),
                    report.errors.len()
                ),
            )
            .with_hint("Fix the listed paths or run without --snapshot"));
        }
        Some(report)
    } else {
        None
    };

    log_status!("rebrand", "Scanning {} for \"{}\"", root.display(), scanner.token());
    let results = scanner.scan_tree(root);
    log_status!("rebrand", "Found {} files", results.len());

    let files: Vec<FileDescriptor> = results
        .iter()
        .map(|r| FileDescriptor::new(&r.file_path, determine_file_context(r)))
        .collect();

    let batch = batch_replace(&replacer, &files, options.batch);
    log_status!(
        "rebrand",
        "Processed {}/{} files, {} replacements",
        batch.success_count,
        batch.total_files,
        batch.total_replacements
    );

    Ok(RebrandReport {
        success: batch.failure_count == 0,
        scan: summarize(&results),
        batch,
        snapshot,
    })
}

/// Everything [`rebrand_tree`] would touch in `root`. Read-only.
///
/// Uses the same scanner as the rebrand, so snapshots under the backup dir
/// are skipped here too.
pub fn dry_run(config: &RebrandConfig, root: &Path) -> Result<DryRunReport> {
    let scanner = tree_scanner(config)?;
    let results = scanner.scan_tree(root);
    let summary = summarize(&results);

    let file_details = results
        .into_iter()
        .map(|r| FileDetail {
            matches: r.total_matches(),
            path: r.file_path,
            contexts: r.contexts,
            sample_matches: r.matches.into_iter().take(SAMPLE_MATCHES).collect(),
        })
        .collect();

    Ok(DryRunReport {
        files_found: summary.total_files,
        total_matches: summary.total_matches,
        file_types: summary.file_types,
        contexts: summary.contexts,
        file_details,
    })
}
