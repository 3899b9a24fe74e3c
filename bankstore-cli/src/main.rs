//! bankstore CLI - account administration from the terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{accounts, init, seed, Session};

/// bankstore - account persistence admin tool
#[derive(Parser)]
#[command(name = "bankstore", version, about, long_about = None)]
struct Cli {
    /// Data directory holding settings.json and the database file
    #[arg(long, global = true, env = "BANKSTORE_DIR")]
    dir: Option<PathBuf>,

    /// Per-operation deadline in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and schema if missing
    Init,

    /// Initialize the schema and insert the demo account
    Seed {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect and manage accounts
    Accounts {
        #[command(subcommand)]
        command: accounts::AccountCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session = Session::new(cli.dir, cli.timeout_ms)?;

    match cli.command {
        Commands::Init => init::run(&session),
        Commands::Seed { json } => seed::run(&session, json).await,
        Commands::Accounts { command } => accounts::run(&session, command).await,
    }
}
