//! Fetch command implementation.

use anyhow::{Context, Result};
use clap::Args;

use ckws::RecordId;

use crate::config::ConnectionArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Record name
    pub record_name: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(connection: &ConnectionArgs, args: FetchArgs) -> Result<()> {
    let database = connection.database()?;

    let record = database
        .fetch(&RecordId::new(&args.record_name))
        .await
        .context("Failed to fetch record")?;

    output::record(&record, args.pretty)
}
