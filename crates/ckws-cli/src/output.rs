//! Output formatting helpers.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use ckws::Record;
use ckws::record::codec;

/// Print a success message.
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a record in its wire form.
pub fn record(record: &Record, pretty: bool) -> Result<()> {
    let wire = codec::encode_record(record).context("Failed to encode record")?;
    if pretty { json_pretty(&wire) } else { json(&wire) }
}
