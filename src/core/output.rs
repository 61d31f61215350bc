//! Report types shared by the library and the CLI.
//!
//! Everything here is plain serializable data assembled from scan and batch
//! results. Nothing in this module touches the filesystem.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::backup::SnapshotReport;
use crate::batch::BatchReport;
use crate::scanner::{ContextLabel, ScanMatch};

// ============================================================================
// Scan Reports
// ============================================================================

/// Totals over a set of scan results. Context counts are match counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total_files: usize,
    pub total_matches: usize,
    pub file_types: BTreeMap<String, usize>,
    pub contexts: BTreeMap<ContextLabel, usize>,
}

/// Per-file entry of a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct FileDetail {
    pub path: PathBuf,
    pub matches: usize,
    pub contexts: BTreeSet<ContextLabel>,
    /// The first few matches, for a quick look.
    pub sample_matches: Vec<ScanMatch>,
}

/// What a rebrand would touch, without touching it.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunReport {
    pub files_found: usize,
    pub total_matches: usize,
    pub file_types: BTreeMap<String, usize>,
    pub contexts: BTreeMap<ContextLabel, usize>,
    pub file_details: Vec<FileDetail>,
}

// ============================================================================
// Rebrand Reports
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RebrandReport {
    pub success: bool,
    pub scan: ScanSummary,
    pub batch: BatchReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotReport>,
}
