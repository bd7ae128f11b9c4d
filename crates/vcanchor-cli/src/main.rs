//! # vcanchor CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vcanchor_cli::anchor::{run_anchor, run_derive, run_info, run_status};
use vcanchor_cli::ledger::LedgerArgs;
use vcanchor_cli::Report;
use vcanchor_service::AnchorService;

/// Credential anchoring client.
///
/// Anchors verifiable-credential identifiers on an EVM ledger as SHA-256
/// commitments and queries their status. Exit codes: 0 ok, 1 error,
/// 2 not anchored, 3 status unknown.
#[derive(Parser, Debug)]
#[command(name = "vcanchor", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    ledger: LedgerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the commitment an identifier anchors under.
    Derive {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        identifier: String,
    },

    /// Anchor an identifier and wait for confirmation.
    Anchor {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        identifier: String,
    },

    /// Check whether an identifier is anchored.
    Status {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        identifier: String,
    },

    /// Show the ledger record for an identifier.
    Info {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        identifier: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(report) => {
            println!("{}", report.render(cli.json));
            ExitCode::from(report.exit_code)
        }
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli) -> Result<Report> {
    let connect = || -> Result<AnchorService> {
        let settings = cli.ledger.settings()?;
        AnchorService::connect(settings).context("ledger configuration")
    };

    match &cli.command {
        Commands::Derive { identifier } => run_derive(identifier),
        Commands::Anchor { identifier } => run_anchor(&connect()?, identifier).await,
        Commands::Status { identifier } => run_status(&connect()?, identifier).await,
        Commands::Info { identifier } => run_info(&connect()?, identifier).await,
    }
}
