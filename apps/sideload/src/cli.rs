//! Command line interface definition

use clap::{Parser, Subcommand};
use sideload_types::status::parse_status;
use sideload_types::ColorChoice;
use std::path::PathBuf;

/// sideload - installer session host shim
#[derive(Parser)]
#[command(name = "sideload")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stream artifacts into installer sessions and report their outcome")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Spool installer sessions into this directory
    #[arg(long, global = true, value_name = "PATH")]
    pub staging_dir: Option<PathBuf>,

    /// Keep sessions in memory instead of staging them on disk
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Read method calls, lifecycle signals and notifications as JSON lines
    /// from stdin and answer each call on stdout
    Serve,

    /// Show how a raw installer status is reported to callers
    Translate {
        /// Raw status code or name (e.g. -1, STATUS_FAILURE_STORAGE)
        #[arg(allow_hyphen_values = true, value_parser = status_arg)]
        status: i32,

        /// Message accompanying the status
        #[arg(short, long)]
        message: Option<String>,
    },
}

fn status_arg(value: &str) -> Result<i32, String> {
    parse_status(value).ok_or_else(|| format!("unknown installer status: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["sideload", "serve"]);
        assert!(matches!(cli.command, Commands::Serve));

        let cli = Cli::parse_from(["sideload", "--json", "--dry-run", "serve"]);
        assert!(cli.global.json);
        assert!(cli.global.dry_run);
        assert!(!cli.global.debug);
    }

    #[test]
    fn test_translate_accepts_negative_and_named_statuses() {
        let cli = Cli::parse_from(["sideload", "translate", "-1"]);
        assert!(matches!(cli.command, Commands::Translate { status: -1, .. }));

        let cli = Cli::parse_from([
            "sideload",
            "translate",
            "failure_storage",
            "--message",
            "disk full",
        ]);
        if let Commands::Translate { status, message } = cli.command {
            assert_eq!(status, 6);
            assert_eq!(message.as_deref(), Some("disk full"));
        } else {
            panic!("Expected Translate command");
        }
    }

    #[test]
    fn test_unknown_status_name_is_rejected() {
        assert!(Cli::try_parse_from(["sideload", "translate", "exploded"]).is_err());
    }
}
