//! Per-key occurrence counting.
//!
//! The first pass feeds every row to a [`KeyAccumulator`], which keeps one
//! representative row per natural key (the first one seen) and a running count.
//! The second pass drains the accumulator into the classifier.
//!
//! Two backends implement the same contract:
//!
//! - [`MemoryAccumulator`] - a hash map in process memory
//! - [`DiskAccumulator`] - an embedded RocksDB store (feature `disk-cache`)
//!
//! The backend is chosen once per run by [`open_accumulator`]; nothing
//! downstream branches on the mode.

mod memory;
pub use memory::MemoryAccumulator;

#[cfg(feature = "disk-cache")]
mod disk;
#[cfg(feature = "disk-cache")]
pub use disk::DiskAccumulator;

use crate::config::CacheMode;
use crate::schema::{Row, Schema};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Lazy sequence of `(representative row, occurrence count)` pairs.
pub type Drain<'a> = Box<dyn Iterator<Item = Result<(Row, u64)>> + 'a>;

/// Counts rows per natural key.
pub trait KeyAccumulator {
    /// Count one row. The first row seen for a key is stored; later rows with
    /// the same key only increment its count.
    ///
    /// # Errors
    /// Fails if the row has no natural key field or the backend fails.
    fn record(&mut self, row: Row) -> Result<()>;

    /// Yield every distinct key's entry exactly once, in backend order.
    /// A second drain yields nothing.
    ///
    /// # Errors
    /// Fails if the backend is closed.
    fn drain(&mut self) -> Result<Drain<'_>>;

    /// Release backend resources. Calling it again is a no-op.
    ///
    /// # Errors
    /// Fails if the backend cannot release its storage.
    fn close(&mut self) -> Result<()>;

    /// Number of distinct keys not yet drained.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Open the backend for `mode`.
///
/// `cache_path` and `schema` are only used by the disk backend: the store
/// lives at `cache_path` and rows are rebuilt against `schema` when drained.
///
/// # Errors
/// Fails if the disk store cannot be created, or if disk mode is requested in
/// a build without the `disk-cache` feature.
#[cfg_attr(not(feature = "disk-cache"), allow(unused_variables))]
pub fn open_accumulator(
    mode: CacheMode,
    cache_path: &Path,
    schema: &Arc<Schema>,
) -> Result<Box<dyn KeyAccumulator>> {
    match mode {
        CacheMode::Memory => Ok(Box::new(MemoryAccumulator::new())),
        #[cfg(feature = "disk-cache")]
        CacheMode::Disk => Ok(Box::new(DiskAccumulator::open(
            cache_path,
            Arc::clone(schema),
        )?)),
        #[cfg(not(feature = "disk-cache"))]
        CacheMode::Disk => anyhow::bail!("disk mode requires the `disk-cache` feature"),
    }
}
