//! Error taxonomy for an import run.
//!
//! Library operations return [`anyhow::Result`] so that I/O failures carry
//! context about the file involved. The failures callers need to tell apart
//! are raised as [`ImportError`] values and can be recovered with
//! [`anyhow::Error::downcast_ref`]:
//!
//! ```
//! use keysplit::{ImportConfig, ImportError, CacheMode};
//!
//! let err = ImportConfig::new("", CacheMode::Memory).validate().unwrap_err();
//! assert!(matches!(
//!     err.downcast_ref::<ImportError>(),
//!     Some(ImportError::InvalidInputPath { .. })
//! ));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the importer.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The input path is empty, does not exist, or names a directory.
    #[error("invalid input path {path:?}: {reason}")]
    InvalidInputPath { path: PathBuf, reason: &'static str },

    /// Two header columns normalize to the same field name.
    #[error("header columns {first:?} and {second:?} both normalize to `{name}`")]
    DuplicateField {
        name: String,
        first: String,
        second: String,
    },

    /// A header column normalizes to an empty field name.
    #[error("header column {column:?} has no alphanumeric characters")]
    EmptyFieldName { column: String },

    /// A field the classifier relies on is absent from the header.
    #[error("required field `{0}` is missing from the header")]
    MissingField(&'static str),

    /// `Importer::run` was called on an importer that already ran.
    #[error("importer has already run; create a new one per input")]
    AlreadyRun,

    /// The input has no header row.
    #[error("input has no header row")]
    EmptyInput,

    /// A data row does not have as many fields as the header.
    #[error("row at line {line} has {found} fields, header has {expected}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A stored accumulator value could not be decoded.
    #[error("corrupt accumulator entry for key {key:?}: {reason}")]
    CorruptEntry { key: String, reason: String },
}

impl ImportError {
    /// True for errors detected before any data is processed.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidInputPath { .. }
                | Self::DuplicateField { .. }
                | Self::EmptyFieldName { .. }
                | Self::MissingField(_)
                | Self::AlreadyRun
        )
    }
}
