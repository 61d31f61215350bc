use clap::Args;
use std::path::PathBuf;

use rebrander::batch::{self, BatchOptions, BatchReport, FileDescriptor};
use rebrander::replace::Replacer;
use rebrander::scanner::ContextLabel;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ReplaceArgs {
    /// Files to rewrite, processed in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Context applied to every file (metadata, content, config, general)
    #[arg(long, default_value = "general")]
    pub context: String,

    /// Skip the per-file sibling backups
    #[arg(long)]
    pub no_backup: bool,

    /// Leave files as they are when a write fails
    #[arg(long)]
    pub no_rollback: bool,
}

pub fn run(args: ReplaceArgs, global: &GlobalArgs) -> CmdResult<BatchReport> {
    let config = global.load_config()?;
    let replacer = Replacer::new(&config)?;
    let context = ContextLabel::parse(&args.context)?;

    let files: Vec<FileDescriptor> = args
        .files
        .into_iter()
        .map(|path| FileDescriptor::new(path, context))
        .collect();

    let options = BatchOptions {
        create_backup: !args.no_backup,
        auto_rollback: !args.no_rollback,
    };

    let report = batch::batch_replace(&replacer, &files, options);
    let exit_code = if report.failure_count == 0 { 0 } else { 1 };

    Ok((report, exit_code))
}
