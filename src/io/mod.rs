//! Input and output plumbing around the `csv` crate.

pub mod compression;
pub mod reader;

use crate::config::Dialect;
use anyhow::{Context, Result};
use std::fs::{File, create_dir_all};
use std::path::Path;

/// Writer for one output partition.
pub type OutputWriter = csv::Writer<File>;

/// Create (or truncate) an output file, creating parent directories as needed.
///
/// # Errors
/// Returns an error if the directories or the file cannot be created.
pub fn create_output(path: impl AsRef<Path>, dialect: &Dialect) -> Result<OutputWriter> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(dialect.writer_builder().from_writer(f))
}
