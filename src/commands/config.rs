use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use rebrander::defaults::{self, RebrandConfig};
use rebrander::Error;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display the effective configuration (file + flags)
    Show {
        /// Show only built-in defaults (ignore rebrand.json and flags)
        #[arg(long)]
        builtin: bool,
    },
    /// Write the effective configuration, phrase tables expanded, to a file
    Init {
        #[arg(default_value = defaults::CONFIG_FILE)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    config: RebrandConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
}

pub fn run(args: ConfigArgs, global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { builtin } => {
            let config = if builtin {
                defaults::builtin_defaults()
            } else {
                global.load_config()?
            };
            Ok((
                ConfigOutput {
                    command: "config.show".to_string(),
                    config,
                    path: None,
                },
                0,
            ))
        }
        ConfigCommand::Init { path, force } => {
            if path.exists() && !force {
                return Err(Error::validation_invalid_argument(
                    "path",
                    format!("{} already exists", path.display()),
                    None,
                    None,
                )
                .with_hint("Pass --force to overwrite it"));
            }

            let mut config = global.load_config()?;
            config.custom_rules = Some(config.custom_rules());
            defaults::save_config(&config, &path)?;

            Ok((
                ConfigOutput {
                    command: "config.init".to_string(),
                    config,
                    path: Some(path),
                },
                0,
            ))
        }
    }
}
