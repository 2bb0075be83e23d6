//! Delete command implementation.

use anyhow::{Context, Result};
use clap::Args;

use ckws::RecordId;

use crate::config::ConnectionArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Record name
    pub record_name: String,

    /// Fetch the record first and delete only if it is unchanged since
    #[arg(long)]
    pub if_unchanged: bool,
}

pub async fn run(connection: &ConnectionArgs, args: DeleteArgs) -> Result<()> {
    let database = connection.database()?;
    let id = RecordId::new(&args.record_name);

    let deleted = if args.if_unchanged {
        let record = database.fetch(&id).await.context("Failed to fetch record")?;
        database.delete_record(&record).await
    } else {
        database.delete(&id).await
    }
    .context("Failed to delete record")?;

    output::success(&format!("Deleted record: {}", deleted));

    Ok(())
}
