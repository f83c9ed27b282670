//! otactl CLI
//!
//! Usage: otactl [--config PATH] [--json] [-v...] <COMMAND>
//!
//! Commands:
//!   status         Initialize and show the current revisions
//!   fetch          Fetch remote head metadata
//!   update         Pull and deploy a revision
//!   rollback       Switch back to the previous deployment
//!   apply-offline  Apply a delta package from disk

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use otactl::infrastructure::events::render_completion;
use otactl::infrastructure::{
    CommitStoreMetadata, ConsoleEventSink, FileSysroot, JsonEventSink, ProcessExecutor,
};
use otactl::{OtaClient, OtaEventSink, Orchestrator};

use cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("otactl={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns whether the operation succeeded
fn run(cli: Cli) -> Result<bool> {
    let (config, warnings) =
        otactl::config::load(cli.config.as_deref()).context("failed to load configuration")?;
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }

    let executor = ProcessExecutor::new();
    let commands = config.ostree_commands();
    let store = FileSysroot::new(config.paths.sysroot.clone(), executor, commands.clone());
    let metadata = CommitStoreMetadata::new(executor, commands);
    let orchestrator = Orchestrator::new(store, metadata, executor, config);

    let console = Arc::new(ConsoleEventSink::stderr());
    let json = cli.json.then(|| Arc::new(JsonEventSink::stdout()));
    let sink: Arc<dyn OtaEventSink> = match &json {
        Some(json) => json.clone(),
        None => console.clone(),
    };

    let client = OtaClient::spawn(orchestrator, sink).context("failed to start OTA worker")?;
    let pending = match cli.command {
        Commands::Status => client.initialize(),
        Commands::Fetch => client.fetch_remote_info(),
        Commands::Update { revision } => client.update(revision),
        Commands::Rollback => client.rollback(),
        Commands::ApplyOffline { package } => client.apply_offline(package),
    };
    let completion = pending.wait();

    match &json {
        Some(json) => json.on_completion(&completion),
        None => {
            let summary = render_completion(&completion, console.supports_color());
            if completion.is_ok() {
                if !summary.is_empty() {
                    println!("{}", summary);
                }
                if let Some(rollback) = client.rollback_descriptor() {
                    println!("rollback: {}", rollback.revision);
                }
            } else {
                eprintln!("{}", summary);
            }
        }
    }

    Ok(completion.is_ok())
}
