//! `stash` — CLI binary entry point.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`Config`] from `STASH_`-prefixed environment
//!    variables.
//! 3. Initialise telemetry (tracing to stderr).
//! 4. Wire ctrl-c to a [`CancellationToken`] shared by every suspension
//!    point.
//! 5. Dispatch the subcommand and map the outcome to a process exit code.

mod commands;
mod config;
mod ingest;
mod telemetry;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use common::StashError;
use config::Config;

/// Share a secret that can be claimed exactly once.
#[derive(Parser)]
#[command(name = "stash", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a secret and print the one-time claim token
    Enstash {
        /// Secret value; read from stdin when omitted
        #[arg(value_name = "SECRET")]
        secret: Option<String>,
    },

    /// Claim a secret: fetch, decrypt, and print it (works once)
    Destash {
        /// Token printed by `stash enstash`
        #[arg(value_name = "TOKEN")]
        token: String,
    },

    /// Delete a stored secret without revealing it
    Unstash {
        /// Token or bare stash id
        #[arg(value_name = "TOKEN_OR_ID")]
        target: String,
    },
}

#[tokio::main]
async fn main() {
    // -----------------------------------------------------------------------
    // 1. Command line
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Telemetry is not yet up; write to stderr directly.
            eprintln!("ERROR: configuration invalid: {e}");
            std::process::exit(1);
        }
    };

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init(&cfg.log_level) {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }

    // -----------------------------------------------------------------------
    // 4. Interrupt handling
    // -----------------------------------------------------------------------
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    // -----------------------------------------------------------------------
    // 5. Dispatch
    // -----------------------------------------------------------------------
    let result: Result<(), StashError> = match cli.command {
        Commands::Enstash { secret } => commands::enstash::run(&cfg, secret, &cancel).await,
        Commands::Destash { token } => commands::destash::run(&cfg, &token, &cancel).await,
        Commands::Unstash { target } => commands::unstash::run(&cfg, &target, &cancel).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
