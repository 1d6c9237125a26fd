//! ISTHMUS Head CLI
//!
//! Drives a head lifecycle end to end against an in-memory base ledger:
//! init and token minting, per-participant commits, quorum collection,
//! off-ledger snapshot rounds, and settlement by close or abort.
//!
//! # Usage
//!
//! ```bash
//! # Generate participant keys and a head config
//! isthmus keys --participants 3 --out head.toml
//!
//! # Run the full lifecycle: init, commit, collect, snapshot, close
//! isthmus run --config head.toml --snapshots 2
//!
//! # Run the abort path: partial commits, deadline expiry, reimbursement
//! isthmus abort --config head.toml --commits 2
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod logging;

use commands::{AbortCommand, KeysCommand, RunCommand};

/// ISTHMUS head protocol driver
#[derive(Parser)]
#[command(name = "isthmus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Two-layer head protocol lifecycle driver", long_about = None)]
struct Cli {
    /// Path to head configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate participant keys and write a head config
    Keys(KeysCommand),

    /// Run the full lifecycle to a successful close
    Run(RunCommand),

    /// Run the abort path: commit partially, expire, reimburse
    Abort(AbortCommand),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level)?;

    match cli.command {
        Commands::Keys(cmd) => cmd.execute(cli.config),
        Commands::Run(cmd) => cmd.execute(cli.config).await,
        Commands::Abort(cmd) => cmd.execute(cli.config).await,
        Commands::Version => {
            println!("isthmus {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
