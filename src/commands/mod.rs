use std::path::PathBuf;

use rebrander::defaults::{self, RebrandConfig};

pub type CmdResult<T> = rebrander::Result<(T, i32)>;

/// Options shared by every subcommand.
pub(crate) struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl GlobalArgs {
    /// Load the configuration and apply `--from`/`--to` on top of it.
    pub fn load_config(&self) -> rebrander::Result<RebrandConfig> {
        let mut config = defaults::load_config(self.config.as_deref())?;

        if let Some(from) = &self.from {
            config.brand.from = from.clone();
        }
        if let Some(to) = &self.to {
            config.brand.to = to.clone();
        }
        // Derived phrase tables must follow the overridden brand
        if self.from.is_some() || self.to.is_some() {
            config.custom_rules = None;
        }

        config.validate()?;
        Ok(config)
    }
}

pub mod apply;
pub mod backup;
pub mod config;
pub mod dry_run;
pub mod replace;
pub mod scan;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (rebrander::Result<serde_json::Value>, i32) {
    crate::tty::status("rebrander is working...");

    match command {
        crate::Commands::Scan(args) => dispatch!(args, global, scan),
        crate::Commands::DryRun(args) => dispatch!(args, global, dry_run),
        crate::Commands::Apply(args) => dispatch!(args, global, apply),
        crate::Commands::Replace(args) => dispatch!(args, global, replace),
        crate::Commands::Backup(args) => dispatch!(args, global, backup),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
