//! # keysplit
//!
//! Splits a large delimited file into three partitions by natural key:
//!
//! - `single_key.csv` - rows whose natural key occurs once
//! - `duplicated_key.csv` - one representative row per key that occurs more than once
//! - `without_first_last.csv` - rows with an empty first page or last page
//!
//! ## Two passes
//!
//! 1. **Accumulate** - every row is fed to a [`KeyAccumulator`], which keeps the
//!    first row seen for each natural key and counts later occurrences.
//! 2. **Classify** - the accumulator is drained through the [`Classifier`],
//!    which writes each representative row to its partitions and keeps the
//!    [`Summary`] counters.
//!
//! All keys are buffered before anything is classified, so counts are exact.
//!
//! ## Accumulator backends
//!
//! | Mode                | Backend                 | Trade-off                              |
//! |---------------------|-------------------------|----------------------------------------|
//! | [`CacheMode::Memory`] | [`MemoryAccumulator`] | fastest, memory grows with distinct keys |
//! | [`CacheMode::Disk`]   | `DiskAccumulator`     | bounded memory, one store write per row  |
//!
//! The disk backend needs the `disk-cache` feature (enabled by default).
//!
//! ## Quick start
//!
//! ```no_run
//! use keysplit::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ImportConfig {
//!     output_dir: "out".into(),
//!     ..ImportConfig::new("fascicles.csv", CacheMode::Memory)
//! };
//! let mut reporter = MemoryReporter::new();
//! let summary = Importer::with_reporter(config, &mut reporter)?.run()?;
//!
//! assert_eq!(summary.distinct_keys, summary.unique_key_rows + summary.duplicated_key_rows);
//! for line in reporter.messages() {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Field names
//!
//! Columns are addressed by a normalized form of their header text (see
//! [`schema::normalize_field_name`]): `"Chave Natural"` is `chavenatural`,
//! `"First Page"` is `firstpage`. The header must contain `chavenatural`,
//! `firstpage` and `lastpage`; other columns are carried through unchanged.
//!
//! ## Feature Flags
//!
//! - `disk-cache` - RocksDB-backed accumulator
//! - `compression-gzip` / `compression-zstd` - transparent input decompression

pub mod accumulator;
pub mod classify;
pub mod config;
pub mod error;
pub mod importer;
pub mod io;
pub mod report;
pub mod schema;
pub mod summary;
pub mod testing;

pub use accumulator::{KeyAccumulator, MemoryAccumulator, open_accumulator};
pub use classify::{Classifier, Partition, Route};
pub use config::{CacheMode, Dialect, ImportConfig};
pub use error::ImportError;
pub use importer::{ImportState, Importer};
pub use io::reader::RecordReader;
pub use report::{MemoryReporter, Reporter, TracingReporter};
pub use schema::{Row, Schema};
pub use summary::Summary;

#[cfg(feature = "disk-cache")]
pub use accumulator::DiskAccumulator;
