//! Save command implementation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use serde_json::Value;

use ckws::value::codec::{self, WireField};
use ckws::{Asset, FieldValue, Record, RecordId, SavePolicy};

use crate::commands::read_input;
use crate::config::ConnectionArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Record type
    #[arg(long = "type", short = 't')]
    pub record_type: String,

    /// Record name (generated when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// JSON object of fields (use - for stdin). Values are either bare JSON
    /// or wire fields like {"value": ..., "type": "TIMESTAMP"}
    #[arg(long)]
    pub json: Option<String>,

    /// Attach a file to a field (field=path). Repeat a field for a list
    #[arg(long = "asset", value_parser = parse_asset)]
    pub assets: Vec<(String, PathBuf)>,

    /// Fetch the existing record and apply the fields to it
    #[arg(long)]
    pub update: bool,

    /// Conflict policy for records that already exist
    #[arg(long, value_enum, default_value_t = Policy::IfUnchanged)]
    pub policy: Policy,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    IfUnchanged,
    ChangedKeys,
    AllKeys,
}

impl From<Policy> for SavePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::IfUnchanged => SavePolicy::IfServerRecordUnchanged,
            Policy::ChangedKeys => SavePolicy::ChangedKeys,
            Policy::AllKeys => SavePolicy::AllKeys,
        }
    }
}

pub async fn run(connection: &ConnectionArgs, args: SaveArgs) -> Result<()> {
    let database = connection.database()?;

    let mut record = if args.update {
        let name = args.name.as_ref().context("--update needs --name")?;
        let existing = database
            .fetch(&RecordId::new(name))
            .await
            .context("Failed to fetch record")?;
        if existing.record_type() != args.record_type {
            bail!(
                "Record {} has type {}, not {}",
                name,
                existing.record_type(),
                args.record_type
            );
        }
        existing
    } else {
        match &args.name {
            Some(name) => Record::with_id(&args.record_type, RecordId::new(name)),
            None => Record::new(&args.record_type),
        }
    };

    if let Some(path) = &args.json {
        let input = read_input(path)?;
        for (field, value) in parse_fields(&input)? {
            record.set(field, value);
        }
    }
    for (field, value) in group_assets(args.assets) {
        record.set(field, value);
    }

    let saved = database
        .save_with_policy(&record, args.policy.into())
        .await
        .context("Failed to save record")?;

    output::record(&saved, args.pretty)?;
    output::success(&format!("Saved record: {}", saved.id()));

    Ok(())
}

fn parse_asset(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((field, path)) if !field.is_empty() && !path.is_empty() => {
            Ok((field.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected field=path, got '{}'", s)),
    }
}

/// Parse a JSON object of field values.
fn parse_fields(input: &[u8]) -> Result<BTreeMap<String, FieldValue>> {
    let object: BTreeMap<String, Value> =
        serde_json::from_slice(input).context("Fields must be a JSON object")?;

    object
        .into_iter()
        .map(|(field, value)| {
            let wire = if value.as_object().is_some_and(|map| map.contains_key("value")) {
                serde_json::from_value::<WireField>(value)
                    .with_context(|| format!("Invalid wire field '{}'", field))?
            } else {
                WireField { value, type_tag: None }
            };
            let decoded = codec::decode_field(&wire)
                .with_context(|| format!("Invalid value for field '{}'", field))?;
            Ok((field, decoded))
        })
        .collect()
}

/// One asset per field, or a list when a field repeats.
fn group_assets(assets: Vec<(String, PathBuf)>) -> BTreeMap<String, FieldValue> {
    let mut grouped: BTreeMap<String, Vec<Asset>> = BTreeMap::new();
    for (field, path) in assets {
        grouped.entry(field).or_default().push(Asset::from_file(path));
    }

    grouped
        .into_iter()
        .map(|(field, mut files)| {
            let value = if files.len() == 1 {
                FieldValue::Asset(files.remove(0))
            } else {
                FieldValue::AssetList(files)
            };
            (field, value)
        })
        .collect()
}
