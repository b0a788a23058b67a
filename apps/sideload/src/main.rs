//! sideload - installer session host shim
//!
//! Wires the session coordinator to a JSON-lines channel so the install
//! flow can be driven without a UI host, and offers a diagnostic view of
//! how raw installer statuses are reported.

mod cli;
mod error;
mod logging;
mod serve;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::error::CliError;
use crate::serve::StdoutLauncher;
use clap::Parser;
use console::style;
use sideload_config::Config;
use sideload_events::EventReceiver;
use sideload_session::bridge::outcome_response;
use sideload_session::status::translate;
use sideload_session::{
    InstallerBackend, InstallerHost, MemoryInstaller, StagingInstaller, UserActionLauncher,
};
use sideload_types::status::status_name;
use sideload_types::{BridgeResponse, ColorChoice, OutputFormat};
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    // Defaults < file < environment < flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);
    config.validate()?;

    init_tracing(cli.global.json, cli.global.debug, &config.log_dir());
    info!("Starting sideload v{}", env!("CARGO_PKG_VERSION"));

    let json_output = cli.global.json || config.general.default_output == OutputFormat::Json;
    let colors_enabled = match config.general.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stdout().features().colors_supported(),
    };
    console::set_colors_enabled(colors_enabled);

    match cli.command {
        Commands::Serve => {
            if cli.global.dry_run {
                serve_with(&config, MemoryInstaller::new()).await
            } else {
                let staging = config.staging_dir();
                info!(staging_dir = %staging.display(), "staging installer sessions");
                serve_with(&config, StagingInstaller::new(staging)).await
            }
        }
        Commands::Translate { status, message } => {
            print_translation(status, message.as_deref(), json_output)
        }
    }
}

async fn serve_with<B: InstallerBackend + 'static>(
    config: &Config,
    backend: B,
) -> Result<(), CliError> {
    let (event_sender, event_receiver) = sideload_events::channel();
    let log_task = tokio::spawn(drain_events(event_receiver));

    let launcher: Arc<dyn UserActionLauncher> = Arc::new(StdoutLauncher);
    let host = InstallerHost::from_config(
        config,
        backend,
        Some(launcher),
        Some(event_sender.clone()),
    );
    let result = serve::run(host, event_sender).await;

    // The host and sender are gone once `run` returns, which closes the
    // channel and lets the log task finish.
    if let Err(e) = log_task.await {
        error!(error = %e, "event log task failed");
    }
    result
}

async fn drain_events(mut receiver: EventReceiver) {
    while let Some(message) = receiver.recv().await {
        logging::log_event_with_tracing(&message);
    }
}

fn print_translation(status: i32, message: Option<&str>, json: bool) -> Result<(), CliError> {
    let outcome = translate(status, message);
    let response = outcome_response(&outcome);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "status": status,
                "outcome": outcome,
                "terminal": outcome.is_terminal(),
                "response": response,
            }))?
        );
        return Ok(());
    }

    let name = status_name(status).unwrap_or("unrecognised");
    println!("{status} ({name})");
    if !outcome.is_terminal() {
        println!(
            "  {} the request stays pending until a terminal status arrives",
            style("non-terminal:").yellow()
        );
        return Ok(());
    }
    match response {
        BridgeResponse::Success { status, message } => {
            println!("  {} status {status}: {message}", style("success").green());
        }
        BridgeResponse::Error {
            code,
            message,
            status,
            details,
        } => {
            println!("  {} {code}: {message}", style("error").red());
            if let Some(status) = status {
                println!("  status: {status}");
            }
            if let Some(details) = details {
                println!("  details: {details}");
            }
        }
        BridgeResponse::NotImplemented => println!("  not implemented"),
    }
    Ok(())
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if let Some(dir) = &global.staging_dir {
        config.paths.staging_dir = Some(dir.clone());
    }
}

/// Initialize tracing/logging
///
/// Serve mode owns stdout, so console logging always goes to stderr.
fn init_tracing(json_mode: bool, debug_enabled_flag: bool, log_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let filter = |default: &str| {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
    };

    if debug_enabled {
        // Structured JSON logs to file
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            if !json_mode {
                eprintln!("Warning: Failed to create log directory: {e}");
            }
        }

        let log_file = log_dir.join(format!(
            "sideload-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(filter("info,sideload=debug,sideload_session=debug"))
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        // Keep stderr quiet so JSON consumers see only protocol output
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter("warn,sideload=info,sideload_session=info"))
            .init();
    }
}
