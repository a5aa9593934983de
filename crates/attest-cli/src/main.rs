//! Attest CLI — Command-line client for the permit credential node.
//!
//! Subcommands: init, status, issue, verify, qr, resolve, revoke.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Attest — Verifiable permit credentials.
#[derive(Parser, Debug)]
#[command(name = "attest", version, about, long_about = None)]
struct Cli {
    /// Log HTTP traffic to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default node configuration file.
    Init(commands::init::InitArgs),
    /// Query the status of a running node.
    Status(commands::status::StatusArgs),
    /// Issue a permit credential.
    Issue(commands::issue::IssueArgs),
    /// Verify a credential by id or as a document.
    Verify(commands::verify::VerifyArgs),
    /// Generate a QR presentation code for a credential.
    Qr(commands::qr::QrArgs),
    /// Resolve a scanned presentation payload.
    Resolve(commands::resolve::ResolveArgs),
    /// Revoke a credential.
    Revoke(commands::revoke::RevokeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Issue(args) => commands::issue::run(args).await,
        Commands::Verify(args) => commands::verify::run(args).await,
        Commands::Qr(args) => commands::qr::run(args).await,
        Commands::Resolve(args) => commands::resolve::run(args).await,
        Commands::Revoke(args) => commands::revoke::run(args).await,
    }
}
