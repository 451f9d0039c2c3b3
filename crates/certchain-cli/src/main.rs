//! # certchain CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use certchain_cli::hash::{run_hash, HashArgs};
use certchain_cli::records::{
    run_audit, run_list, run_resolve, run_submit, run_verify, StoreOptions, SubmitArgs,
};

/// CertChain record tool.
///
/// Submits certificate records to the snapshot file shared with the HTTP
/// service, resolves and verifies them by content hash, and computes hashes
/// offline.
#[derive(Parser, Debug)]
#[command(name = "certchain", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    store: StoreOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate, hash, and store a certificate record.
    Submit(SubmitArgs),

    /// Print the record stored under a content hash.
    Resolve {
        /// 64-character hex content hash.
        hash: String,
    },

    /// Recompute the hash of a stored record and compare.
    Verify {
        /// 64-character hex content hash.
        hash: String,
    },

    /// Verify every stored record.
    Audit,

    /// List stored hashes in insertion order.
    List,

    /// Compute a content hash without touching the store.
    Hash(HashArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(db = %cli.store.db.display(), "certchain CLI starting");

    let result = match &cli.command {
        Commands::Submit(args) => run_submit(args, &cli.store),
        Commands::Resolve { hash } => run_resolve(hash, &cli.store),
        Commands::Verify { hash } => run_verify(hash, &cli.store),
        Commands::Audit => run_audit(&cli.store),
        Commands::List => run_list(&cli.store),
        Commands::Hash(args) => run_hash(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
