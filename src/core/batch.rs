//! Batch orchestration — backup, rewrite and roll back one file at a time.
//!
//! A failure in one file never stops the batch; it is recorded on that
//! file's result and the next file is processed.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::backup;
use crate::error::Result;
use crate::replace::{AppliedRule, ReplaceOptions, Replacer};
use crate::scanner::ContextLabel;
use crate::utils::io;

/// A file to rewrite and the context its content should be treated as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub context: ContextLabel,
}

impl FileDescriptor {
    pub fn new(path: impl Into<PathBuf>, context: ContextLabel) -> Self {
        Self {
            path: path.into(),
            context,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub create_backup: bool,
    pub auto_rollback: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            create_backup: true,
            auto_rollback: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOperationResult {
    pub file_path: PathBuf,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    pub applied_rules: Vec<AppliedRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOperationResult {
    pub fn total_replacements(&self) -> usize {
        self.applied_rules.iter().map(|r| r.count).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total_files: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<FileOperationResult>,
    pub total_replacements: usize,
    pub backup_paths: Vec<PathBuf>,
}

/// Rewrite one file in place.
///
/// Validation failures leave the file untouched. I/O failures after a backup
/// was taken trigger a restore when `auto_rollback` is set, and the outcome
/// of that restore is appended to the error.
pub fn replace_in_file(
    replacer: &Replacer,
    path: &Path,
    context: ContextLabel,
    options: BatchOptions,
) -> FileOperationResult {
    let mut result = FileOperationResult {
        file_path: path.to_path_buf(),
        success: false,
        backup_path: None,
        applied_rules: Vec::new(),
        error: None,
    };

    if let Err(e) = rewrite(replacer, path, context, options, &mut result) {
        let mut message = e.to_string();
        if let (Some(backup_path), true) = (&result.backup_path, options.auto_rollback) {
            message.push_str(&restore_from(path, backup_path));
        }
        result.success = false;
        result.error = Some(message);
    }

    result
}

/// Restore `path` from `backup` and describe the outcome as an error suffix.
fn restore_from(path: &Path, backup: &Path) -> String {
    match backup::rollback(path, backup) {
        Ok(()) => " (automatically rolled back)".to_string(),
        Err(e) => format!(" (rollback failed: {})", e),
    }
}

fn rewrite(
    replacer: &Replacer,
    path: &Path,
    context: ContextLabel,
    options: BatchOptions,
    result: &mut FileOperationResult,
) -> Result<()> {
    if options.create_backup {
        result.backup_path = Some(backup::create_backup(path)?);
    }

    let original = io::read_file(path, "read file for replacement")?;
    let replace_options = ReplaceOptions {
        validator: replacer.validator_for(path),
    };
    let outcome = replacer.apply(&original, context, replace_options);

    if !outcome.success {
        result.error = outcome.error;
        return Ok(());
    }

    if outcome.changed() {
        io::write_file(path, &outcome.updated_content, "write replaced content")?;
        result.applied_rules = outcome.applied_rules;
    }

    result.success = true;
    Ok(())
}

/// Run [`replace_in_file`] over `files` in order.
pub fn batch_replace(
    replacer: &Replacer,
    files: &[FileDescriptor],
    options: BatchOptions,
) -> BatchReport {
    let mut report = BatchReport {
        total_files: files.len(),
        success_count: 0,
        failure_count: 0,
        results: Vec::with_capacity(files.len()),
        total_replacements: 0,
        backup_paths: Vec::new(),
    };

    for file in files {
        let result = replace_in_file(replacer, &file.path, file.context, options);

        if result.success {
            report.success_count += 1;
            report.total_replacements += result.total_replacements();
            log_status!(
                "rebrand",
                "{}: {} replacements",
                file.path.display(),
                result.total_replacements()
            );
        } else {
            report.failure_count += 1;
            log_status!(
                "rebrand",
                "{}: failed: {}",
                file.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }

        // Backups of failed files are listed too so cleanup can find them
        if let Some(backup_path) = &result.backup_path {
            report.backup_paths.push(backup_path.clone());
        }
        report.results.push(result);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::RebrandConfig;
    use std::fs;

    fn replacer() -> Replacer {
        Replacer::new(&RebrandConfig::default()).unwrap()
    }

    #[test]
    fn file_is_rewritten_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Hero.jsx");
        fs::write(&file, "Welcome to Resonance theme by resonance team").unwrap();

        let result = replace_in_file(&replacer(), &file, ContextLabel::General, BatchOptions::default());

        assert!(result.success);
        assert_eq!(result.total_replacements(), 2);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "Welcome to Evoleotion theme by evoleotion team"
        );
        let backup = result.backup_path.unwrap();
        assert_eq!(
            fs::read_to_string(backup).unwrap(),
            "Welcome to Resonance theme by resonance team"
        );
    }

    #[test]
    fn unchanged_file_is_success_with_no_rules() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clean.md");
        fs::write(&file, "Nothing to see here").unwrap();

        let options = BatchOptions {
            create_backup: false,
            ..BatchOptions::default()
        };
        let result = replace_in_file(&replacer(), &file, ContextLabel::Content, options);

        assert!(result.success);
        assert!(result.applied_rules.is_empty());
        assert!(result.backup_path.is_none());
    }

    #[test]
    fn invalid_json_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        let original = r#"{"name": "resonance-next""#;
        fs::write(&file, original).unwrap();

        let result = replace_in_file(&replacer(), &file, ContextLabel::Config, BatchOptions::default());

        assert!(!result.success);
        assert!(result.error.unwrap().contains("JSON syntax validation failed"));
        assert_eq!(fs::read_to_string(&file).unwrap(), original);
    }

    #[test]
    fn missing_file_fails_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let result = replace_in_file(
            &replacer(),
            &dir.path().join("missing.js"),
            ContextLabel::General,
            BatchOptions::default(),
        );

        assert!(!result.success);
        assert!(result.backup_path.is_none());
        assert!(result.error.is_some());
    }

    #[test]
    fn batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let valid = dir.path().join("valid.js");
        fs::write(&valid, "const brand = 'Resonance';").unwrap();

        let files = vec![
            FileDescriptor::new(&valid, ContextLabel::General),
            FileDescriptor::new(dir.path().join("missing.js"), ContextLabel::General),
        ];
        let report = batch_replace(&replacer(), &files, BatchOptions::default());

        assert_eq!(report.total_files, 2);
        assert_eq!(report.success_count, 1);
        assert_eq!(report.failure_count, 1);
        assert_eq!(report.total_replacements, 1);
        assert_eq!(report.backup_paths.len(), 1);
        assert_eq!(fs::read_to_string(&valid).unwrap(), "const brand = 'Evoleotion';");
    }

    #[test]
    fn read_failure_after_backup_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // Not UTF-8: the backup copy succeeds, reading the text fails
        let file = dir.path().join("binary.js");
        let bytes = [b'R', 0xff, 0xfe, b'\n'];
        fs::write(&file, bytes).unwrap();

        let result = replace_in_file(&replacer(), &file, ContextLabel::General, BatchOptions::default());

        assert!(!result.success);
        assert!(result.backup_path.is_some());
        let error = result.error.unwrap();
        assert!(error.starts_with("IO error"), "{error}");
        assert!(error.ends_with(" (automatically rolled back)"), "{error}");
        assert_eq!(fs::read(&file).unwrap(), bytes);
    }

    #[test]
    fn read_failure_without_rollback_keeps_plain_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("binary.js");
        fs::write(&file, [0xffu8, 0xfe]).unwrap();

        let options = BatchOptions {
            auto_rollback: false,
            ..BatchOptions::default()
        };
        let result = replace_in_file(&replacer(), &file, ContextLabel::General, options);

        assert!(!result.success);
        assert!(!result.error.unwrap().contains("rolled back"));
    }

    #[test]
    fn missing_backup_reports_rollback_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "Resonance").unwrap();
        let backup_path = backup::create_backup(&file).unwrap();
        fs::remove_file(&backup_path).unwrap();

        let suffix = restore_from(&file, &backup_path);

        assert!(suffix.starts_with(" (rollback failed: Backup not found: "), "{suffix}");
        assert!(suffix.ends_with(')'));
        assert_eq!(fs::read_to_string(&file).unwrap(), "Resonance");
    }

    #[test]
    fn existing_backup_restores_original() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "Resonance").unwrap();
        let backup_path = backup::create_backup(&file).unwrap();
        fs::write(&file, "half-writ").unwrap();

        assert_eq!(restore_from(&file, &backup_path), " (automatically rolled back)");
        assert_eq!(fs::read_to_string(&file).unwrap(), "Resonance");
    }
}
