use clap::Args;
use std::path::PathBuf;

use rebrander::rebrand;
use rebrander::DryRunReport;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct DryRunArgs {
    /// Directory to analyze
    #[arg(default_value = ".")]
    pub root: PathBuf,
}

pub fn run(args: DryRunArgs, global: &GlobalArgs) -> CmdResult<DryRunReport> {
    let config = global.load_config()?;

    Ok((rebrand::dry_run(&config, &args.root)?, 0))
}
