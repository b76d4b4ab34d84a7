//! Counters for one import run.
//!
//! The classifier counts once per drained key, not once per input row: a key
//! seen five times adds one to `duplicated_key_rows` (its representative row is
//! written once) and five to `duplicated_key_occurrences`. So for every run
//!
//! ```text
//! distinct_keys = unique_key_rows + duplicated_key_rows
//! total_rows    = unique_key_rows + duplicated_key_occurrences
//! ```

use crate::config::CacheMode;
use crate::report::Reporter;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Final statistics of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub mode: CacheMode,
    /// Data rows read from the input.
    pub total_rows: u64,
    /// Distinct natural keys.
    pub distinct_keys: u64,
    /// Keys seen exactly once (rows written to the single-key output).
    pub unique_key_rows: u64,
    /// Keys seen more than once (rows written to the duplicated-key output).
    pub duplicated_key_rows: u64,
    /// Input rows sharing a duplicated key.
    pub duplicated_key_occurrences: u64,
    /// Drained rows with an empty first or last page.
    pub missing_boundary_rows: u64,
}

impl Summary {
    #[must_use]
    pub fn new(mode: CacheMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Human-readable lines, in reporting order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("execution mode: {}", self.mode),
            format!("total rows: {}", self.total_rows),
            format!("rows with duplicated natural key: {}", self.duplicated_key_rows),
            format!("rows with unique natural key: {}", self.unique_key_rows),
            format!(
                "rows missing first page or last page: {}",
                self.missing_boundary_rows
            ),
        ]
    }

    /// Send every line of [`Summary::lines`] to `reporter`.
    pub fn report_to(&self, reporter: &mut dyn Reporter) {
        for line in self.lines() {
            reporter.report(&line);
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Write the summary as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let formatted = serde_json::to_string_pretty(self)?;
        file.write_all(formatted.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}
