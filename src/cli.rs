use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// otactl - atomic OS update and rollback
#[derive(Parser, Debug)]
#[command(name = "otactl")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Configuration is read from /etc/otactl/config.toml unless --config is given.")]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print events as NDJSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show booted, default, remote and rollback revisions
    Status,

    /// Fetch metadata for the remote branch head
    Fetch,

    /// Pull a revision and deploy it as the new default
    Update {
        /// Commit checksum or ref to deploy
        revision: String,
    },

    /// Make the previous deployment the default again
    Rollback,

    /// Apply a static-delta package from disk and deploy it
    ApplyOffline {
        /// Path to the delta package
        package: PathBuf,
    },
}
