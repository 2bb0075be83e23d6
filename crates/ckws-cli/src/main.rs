//! ckws - CLI tool for CloudKit container exploration.
//!
//! This is a thin wrapper over the `ckws` library, intended for manual
//! inspection of records and for debugging request signatures.

mod cli;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Fetch(args) => commands::fetch::run(&cli.connection, args).await,
        Commands::Save(args) => commands::save::run(&cli.connection, args).await,
        Commands::Delete(args) => commands::delete::run(&cli.connection, args).await,
        Commands::Query(args) => commands::query::run(&cli.connection, args).await,
        Commands::Sign(args) => commands::sign::run(&cli.connection, args),
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
