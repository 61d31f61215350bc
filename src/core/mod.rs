// Public modules
pub mod backup;
pub mod batch;
pub mod error;
pub mod output;
pub mod rebrand;
pub mod replace;
pub mod scanner;

// Public modules for CLI access
pub mod defaults;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use output::{DryRunReport, FileDetail, RebrandReport, ScanSummary};
