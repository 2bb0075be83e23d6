//! Query command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use ckws::{Predicate, Query};

use crate::config::ConnectionArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Record type
    #[arg(long = "type", short = 't')]
    pub record_type: String,

    /// Predicate comparing one field with one value (e.g., 'age >= 18')
    #[arg(long, default_value = "TRUEPREDICATE")]
    pub filter: String,

    /// Sort by a field, optionally descending (field or field:desc)
    #[arg(long, value_parser = parse_sort)]
    pub sort: Vec<(String, bool)>,

    /// Maximum number of records to return
    #[arg(long)]
    pub limit: Option<u32>,

    /// Continuation marker from a previous page
    #[arg(long)]
    pub continuation: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(connection: &ConnectionArgs, args: QueryArgs) -> Result<()> {
    let predicate = Predicate::new(&args.filter, &[]).context("Invalid predicate")?;
    let mut query = Query::new(&args.record_type, &predicate).context("Invalid predicate")?;
    for (field, ascending) in args.sort {
        query = query.sorted_by(field, ascending);
    }

    let database = connection.database()?;
    let page = database
        .perform(&query, None, args.limit, args.continuation)
        .await
        .context("Failed to query records")?;

    if page.records.is_empty() {
        eprintln!("{}", "No records found.".dimmed());
    }

    for record in &page.records {
        output::record(record, args.pretty)?;
    }

    if let Some(marker) = &page.continuation_marker {
        eprintln!();
        eprintln!("{}: {}", "Continuation".dimmed(), marker);
    }

    Ok(())
}

fn parse_sort(s: &str) -> Result<(String, bool), String> {
    let (field, ascending) = match s.rsplit_once(':') {
        Some((field, "asc")) => (field, true),
        Some((field, "desc")) => (field, false),
        Some((_, order)) => return Err(format!("unknown sort order '{}'", order)),
        None => (s, true),
    };
    if field.is_empty() {
        return Err("empty sort field".to_string());
    }
    Ok((field.to_string(), ascending))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("age").unwrap(), ("age".to_string(), true));
        assert_eq!(parse_sort("age:asc").unwrap(), ("age".to_string(), true));
        assert_eq!(parse_sort("age:desc").unwrap(), ("age".to_string(), false));
        assert!(parse_sort("age:sideways").is_err());
        assert!(parse_sort(":desc").is_err());
    }
}
