//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{delete, fetch, query, save, sign};
use crate::config::ConnectionArgs;

/// CloudKit web services CLI for container exploration.
#[derive(Parser, Debug)]
#[command(name = "ckws")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a single record
    Fetch(fetch::FetchArgs),

    /// Create or update a record, uploading assets
    Save(save::SaveArgs),

    /// Delete a record
    Delete(delete::DeleteArgs),

    /// Query records of one type
    Query(query::QueryArgs),

    /// Sign a request body offline and print the headers
    Sign(sign::SignArgs),
}
