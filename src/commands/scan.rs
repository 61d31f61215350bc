use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use rebrander::scanner::{self, ContextLabel, ScanResult, Scanner};
use rebrander::ScanSummary;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Only list files with at least one match in this context
    #[arg(long, value_name = "CONTEXT")]
    pub context: Option<String>,
}

#[derive(Serialize)]
pub struct ScanOutput {
    pub root: PathBuf,
    pub token: String,
    pub summary: ScanSummary,
    pub results: Vec<ScanResult>,
}

pub fn run(args: ScanArgs, global: &GlobalArgs) -> CmdResult<ScanOutput> {
    let config = global.load_config()?;
    let scanner = Scanner::from_config(&config)?;

    let mut results = scanner.scan_tree(&args.root);
    if let Some(context) = args.context.as_deref() {
        let label = ContextLabel::parse(context)?;
        results = scanner::filter_by_context(&results, label)
            .into_iter()
            .cloned()
            .collect();
    }

    Ok((
        ScanOutput {
            root: args.root,
            token: scanner.token().to_string(),
            summary: scanner::summarize(&results),
            results,
        },
        0,
    ))
}
