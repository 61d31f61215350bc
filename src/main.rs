use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{apply, backup, config, dry_run, replace, scan};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "rebrander")]
#[command(version = VERSION)]
#[command(about = "Rename a brand token across a project tree, safely")]
struct Cli {
    /// Path to a rebrand.json (default: ./rebrand.json when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the brand being replaced
    #[arg(long, global = true, value_name = "BRAND")]
    from: Option<String>,

    /// Override the replacement brand
    #[arg(long, global = true, value_name = "BRAND")]
    to: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find brand occurrences and classify their context
    Scan(scan::ScanArgs),
    /// Report what a rebrand would change without writing anything
    DryRun(dry_run::DryRunArgs),
    /// Rebrand every matching file under a directory
    Apply(apply::ApplyArgs),
    /// Rebrand an explicit list of files
    Replace(replace::ReplaceArgs),
    /// File backups and whole-tree snapshots
    Backup(backup::BackupArgs),
    /// Show or write the rebrand configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        config: cli.config,
        from: cli.from,
        to: cli.to,
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    if let Err(e) = output::print_json_result(json_result) {
        eprintln!("{}", e);
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
