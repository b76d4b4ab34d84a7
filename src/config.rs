//! Run configuration.
//!
//! ```
//! use keysplit::{CacheMode, ImportConfig};
//!
//! let config = ImportConfig {
//!     output_dir: "./out".into(),
//!     ..ImportConfig::new("fascicles.csv", CacheMode::Disk)
//! };
//! assert_eq!(config.cache_path.to_str(), Some("cache"));
//! ```

use crate::error::ImportError;
use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Where per-key counts are accumulated during the first pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Hash map in process memory. Fastest; bounded by the number of distinct keys.
    #[default]
    Memory,
    /// Embedded key-value store on disk, for inputs whose keys do not fit in memory.
    Disk,
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Disk => f.write_str("disk"),
        }
    }
}

/// Delimited-text dialect used for both the input and the three outputs.
///
/// The default matches the spreadsheet convention: comma separated, fields
/// quoted with `"` and embedded quotes doubled, CRLF record terminator.
#[derive(Clone, Copy, Debug)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
    /// Escape character used instead of doubling quotes, if any.
    pub escape: Option<u8>,
    pub double_quote: bool,
    /// Lines starting with this byte are skipped when reading.
    pub comment: Option<u8>,
    pub terminator: csv::Terminator,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            escape: None,
            double_quote: true,
            comment: None,
            terminator: csv::Terminator::CRLF,
        }
    }
}

impl Dialect {
    pub(crate) fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut b = csv::ReaderBuilder::new();
        b.has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(self.escape)
            .double_quote(self.double_quote)
            .comment(self.comment);
        b
    }

    pub(crate) fn writer_builder(&self) -> csv::WriterBuilder {
        let mut b = csv::WriterBuilder::new();
        b.has_headers(false)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(self.escape.unwrap_or(b'\\'))
            .double_quote(self.double_quote)
            .terminator(self.terminator);
        b
    }
}

/// Configuration for one [`Importer`](crate::Importer) run.
#[derive(Clone, Debug)]
pub struct ImportConfig {
    /// Delimited input file; the first row is the header.
    pub input: PathBuf,
    /// Accumulator backend.
    pub mode: CacheMode,
    /// Directory the three output files are written to.
    pub output_dir: PathBuf,
    /// Location of the on-disk store in [`CacheMode::Disk`]. Removed when the run ends.
    pub cache_path: PathBuf,
    pub dialect: Dialect,
}

impl ImportConfig {
    /// Configuration with outputs in the working directory and default dialect.
    pub fn new(input: impl Into<PathBuf>, mode: CacheMode) -> Self {
        Self {
            input: input.into(),
            mode,
            output_dir: PathBuf::from("."),
            cache_path: PathBuf::from("cache"),
            dialect: Dialect::default(),
        }
    }

    /// Check the input path without opening it.
    ///
    /// # Errors
    /// [`ImportError::InvalidInputPath`] if the path is empty, missing, or a directory.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.input.as_os_str().is_empty() {
            "path is empty"
        } else if self.input.is_dir() {
            "path is a directory"
        } else if !self.input.exists() {
            "file does not exist"
        } else {
            return Ok(());
        };
        Err(ImportError::InvalidInputPath {
            path: self.input.clone(),
            reason,
        }
        .into())
    }
}
