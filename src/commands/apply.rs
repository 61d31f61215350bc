use clap::Args;
use std::path::PathBuf;

use rebrander::batch::BatchOptions;
use rebrander::rebrand::{self, RebrandOptions};
use rebrander::RebrandReport;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ApplyArgs {
    /// Directory to rebrand
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Skip the per-file sibling backups
    #[arg(long)]
    pub no_backup: bool,

    /// Leave files as they are when a write fails
    #[arg(long)]
    pub no_rollback: bool,

    /// Copy the whole tree to the backup directory first
    #[arg(long)]
    pub snapshot: bool,
}

pub fn run(args: ApplyArgs, global: &GlobalArgs) -> CmdResult<RebrandReport> {
    let config = global.load_config()?;

    let options = RebrandOptions {
        batch: BatchOptions {
            create_backup: !args.no_backup,
            auto_rollback: !args.no_rollback,
        },
        snapshot: args.snapshot,
    };

    let report = rebrand::rebrand_tree(&config, &args.root, options)?;
    let exit_code = if report.success { 0 } else { 1 };

    Ok((report, exit_code))
}
