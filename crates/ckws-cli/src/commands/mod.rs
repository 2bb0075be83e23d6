//! Subcommand implementations.

pub mod delete;
pub mod fetch;
pub mod query;
pub mod save;
pub mod sign;

use std::io::{self, Read};

use anyhow::{Context, Result};

/// Read a file argument, with `-` meaning stdin.
pub(crate) fn read_input(path: &str) -> Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read from stdin")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read {}", path))
    }
}
