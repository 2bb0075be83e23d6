//! Sign command implementation.
//!
//! Works offline: prints what a request would carry so signatures can be
//! compared against another client's.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;

use ckws::{Environment, ServiceUrl};
use ckws::auth::canonical_payload;

use crate::commands::read_input;
use crate::config::ConnectionArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Signed path (e.g., /database/1/iCloud.com.example/development/public/records/query)
    #[arg(long, conflicts_with = "operation")]
    pub path: Option<String>,

    /// Operation to build the path from the connection settings (e.g., records/query)
    #[arg(long)]
    pub operation: Option<String>,

    /// Request body file (use - for stdin; empty when omitted)
    #[arg(long)]
    pub body: Option<String>,

    /// Signing time as RFC 3339 (defaults to now)
    #[arg(long)]
    pub date: Option<String>,

    /// Print the headers as a JSON object
    #[arg(long)]
    pub json: bool,
}

pub fn run(connection: &ConnectionArgs, args: SignArgs) -> Result<()> {
    let signer = connection.signer()?;

    let path = match (&args.path, &args.operation) {
        (Some(path), _) => path.clone(),
        (None, Some(operation)) => {
            let container = connection
                .container
                .as_ref()
                .context("--operation needs a container. Pass --container or set CKWS_CONTAINER.")?;
            let environment = connection.environment.parse::<Environment>().context("Invalid environment")?;
            ServiceUrl::default().database_path(container, environment, connection.scope()?, operation)
        }
        (None, None) => bail!("Either --path or --operation is required"),
    };

    let body = match &args.body {
        Some(file) => read_input(file)?,
        None => Vec::new(),
    };

    let timestamp = match &args.date {
        Some(date) => DateTime::parse_from_rfc3339(date)
            .context("Invalid --date, expected RFC 3339")?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let headers = signer
        .headers(&body, timestamp, &path)
        .context("Failed to sign request")?;

    if args.json {
        let map: BTreeMap<&str, &str> = headers.pairs().into_iter().collect();
        return output::json_pretty(&map);
    }

    output::field("Payload", &canonical_payload(&body, timestamp, &path));
    for (name, value) in headers.pairs() {
        println!("{}: {}", name, value);
    }

    Ok(())
}
