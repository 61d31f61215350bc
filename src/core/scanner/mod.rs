//! Scanner — find brand-token occurrences across a file tree.
//!
//! Walks the tree depth-first, prunes excluded directory names, opens only
//! files with an accepted extension, and records every case-insensitive
//! occurrence of the token with its line-local context label.

mod context;

pub use context::{ContextClassifier, ContextLabel};

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::defaults::{RebrandConfig, ScanConfig};
use crate::error::{Error, Result};
use crate::output::ScanSummary;
use crate::utils::io;

// ============================================================================
// Types
// ============================================================================

/// A single occurrence of the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanMatch {
    /// Line number (1-indexed).
    pub line: usize,
    /// Character column of the match start (1-indexed).
    pub column: usize,
    /// The text as it appears in the file.
    pub matched_text: String,
    pub context: ContextLabel,
    /// The trimmed line, for display.
    pub line_text: String,
}

/// Every occurrence found in one file.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub file_path: PathBuf,
    /// Extension without the leading dot, empty when the file has none.
    pub file_extension: String,
    pub matches: Vec<ScanMatch>,
    pub contexts: BTreeSet<ContextLabel>,
}

impl ScanResult {
    pub fn total_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Number of matches carrying `label`.
    pub fn count_for(&self, label: ContextLabel) -> usize {
        self.matches.iter().filter(|m| m.context == label).count()
    }
}

// ============================================================================
// Scanner
// ============================================================================

pub struct Scanner {
    token: String,
    pattern: Regex,
    classifier: ContextClassifier,
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
}

impl Scanner {
    pub fn new(token: &str, options: &ScanConfig) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::validation_invalid_argument(
                "token",
                "Scan token must not be empty",
                None,
                None,
            ));
        }

        let pattern = Regex::new(&format!("(?i){}", regex::escape(token)))
            .map_err(|e| Error::internal_unexpected(e.to_string()))?;

        Ok(Self {
            token: token.to_string(),
            pattern,
            classifier: ContextClassifier::for_token(token)?,
            extensions: options
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
            exclude_dirs: options.exclude_dirs.clone(),
        })
    }

    /// Scanner for the configured brand's `from` token.
    pub fn from_config(config: &RebrandConfig) -> Result<Self> {
        Self::new(&config.brand.from, &config.scan)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Scan every accepted file under `root`. Only files with at least one
    /// match are returned. Unreadable nodes are logged and skipped.
    pub fn scan_tree(&self, root: &Path) -> Vec<ScanResult> {
        let mut results = Vec::new();
        self.walk(root, &mut results);
        results
    }

    /// Scan one file. The result may contain zero matches.
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult> {
        let content = io::read_file(path, "scan file")?;
        Ok(self.scan_content(path, &content))
    }

    /// Scan already-loaded content as if it came from `path`.
    pub fn scan_content(&self, path: &Path, content: &str) -> ScanResult {
        let mut matches = Vec::new();

        for (index, line) in content.split('\n').enumerate() {
            for found in self.pattern.find_iter(line) {
                matches.push(ScanMatch {
                    line: index + 1,
                    column: line[..found.start()].chars().count() + 1,
                    matched_text: found.as_str().to_string(),
                    context: self.classifier.classify(line),
                    line_text: line.trim().to_string(),
                });
            }
        }

        let contexts = matches.iter().map(|m| m.context).collect();

        ScanResult {
            file_path: path.to_path_buf(),
            file_extension: extension_of(path),
            matches,
            contexts,
        }
    }

    /// Whether `path` has one of the accepted extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        let ext = extension_of(path);
        !ext.is_empty() && self.extensions.iter().any(|e| *e == ext)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }

    fn walk(&self, dir: &Path, results: &mut Vec<ScanResult>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log_status!("scan", "Skipping unreadable directory {}: {}", dir.display(), e);
                return;
            }
        };

        let mut entries: Vec<_> = entries.flatten().collect();
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                let name = entry.file_name().to_string_lossy().to_string();
                if self.is_excluded(&name) {
                    continue;
                }
                self.walk(&path, results);
            } else if file_type.is_file() && self.accepts(&path) {
                match self.scan_file(&path) {
                    Ok(result) if result.has_matches() => results.push(result),
                    Ok(_) => {}
                    Err(e) => {
                        log_status!("scan", "Skipping unreadable file {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default()
}

// ============================================================================
// Aggregation
// ============================================================================

/// Totals across scan results, grouped by extension and by context.
///
/// Context counts are match counts, not file counts.
pub fn summarize(results: &[ScanResult]) -> ScanSummary {
    let mut file_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut contexts: BTreeMap<ContextLabel, usize> = BTreeMap::new();

    for result in results {
        *file_types.entry(result.file_extension.clone()).or_default() += 1;
        for m in &result.matches {
            *contexts.entry(m.context).or_default() += 1;
        }
    }

    ScanSummary {
        total_files: results.len(),
        total_matches: results.iter().map(ScanResult::total_matches).sum(),
        file_types,
        contexts,
    }
}

/// Results whose file-level context set includes `label`.
pub fn filter_by_context(results: &[ScanResult], label: ContextLabel) -> Vec<&ScanResult> {
    results
        .iter()
        .filter(|r| r.contexts.contains(&label))
        .collect()
}
