//! Fixtures and assertions for testing imports.
//!
//! [`FixtureBuilder`] writes an input with a known shape and can compute the
//! [`Summary`] an import of it must produce:
//!
//! ```
//! use keysplit::testing::FixtureBuilder;
//! use keysplit::CacheMode;
//!
//! let fixture = FixtureBuilder::new()
//!     .unique(10)
//!     .duplicated(3, 4)
//!     .missing_first_page(2);
//! let expected = fixture.expected(CacheMode::Memory);
//! assert_eq!(expected.total_rows, 10 + 3 * 4 + 2);
//! assert_eq!(expected.duplicated_key_rows, 3);
//! assert_eq!(expected.missing_boundary_rows, 2);
//! ```

use crate::config::{CacheMode, Dialect};
use crate::summary::Summary;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs::File;
use std::path::Path;

/// Header used by [`FixtureBuilder`]; exercises diacritics and mixed case.
pub const FIXTURE_HEADER: [&str; 5] = ["Chave Natural", "ISSN", "Número", "First Page", "Last Page"];

const KEY: usize = 0;
const FIRST: usize = 3;
const LAST: usize = 4;

/// Builds delimited inputs with a known number of unique, duplicated and
/// missing-page rows.
#[derive(Clone, Debug, Default)]
pub struct FixtureBuilder {
    rows: Vec<Vec<String>>,
    next_key: u64,
}

impl FixtureBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_key(&mut self) -> String {
        self.next_key += 1;
        format!("S{:08}", self.next_key)
    }

    fn push(&mut self, key: &str, first: &str, last: &str) {
        let n = self.rows.len() + 1;
        self.rows.push(vec![
            key.to_owned(),
            "0034-8910".to_owned(),
            n.to_string(),
            first.to_owned(),
            last.to_owned(),
        ]);
    }

    /// `n` keys that occur once, with both pages set.
    #[must_use]
    pub fn unique(mut self, n: usize) -> Self {
        for _ in 0..n {
            let key = self.fresh_key();
            self.push(&key, "1", "12");
        }
        self
    }

    /// `keys` keys that occur `copies` times each, copies spread across the
    /// input rather than adjacent.
    #[must_use]
    pub fn duplicated(mut self, keys: usize, copies: usize) -> Self {
        let ks: Vec<String> = (0..keys).map(|_| self.fresh_key()).collect();
        for copy in 0..copies {
            for key in &ks {
                let first = (copy + 1).to_string();
                self.push(key, &first, "99");
            }
        }
        self
    }

    /// `n` unique keys with an empty first page.
    #[must_use]
    pub fn missing_first_page(mut self, n: usize) -> Self {
        for _ in 0..n {
            let key = self.fresh_key();
            self.push(&key, "", "12");
        }
        self
    }

    /// `n` unique keys with an empty last page.
    #[must_use]
    pub fn missing_last_page(mut self, n: usize) -> Self {
        for _ in 0..n {
            let key = self.fresh_key();
            self.push(&key, "7", "");
        }
        self
    }

    /// Append a row verbatim, in [`FIXTURE_HEADER`] order.
    #[must_use]
    pub fn row(mut self, fields: [&str; 5]) -> Self {
        self.rows.push(fields.iter().map(|f| (*f).to_owned()).collect());
        self
    }

    /// The summary an import of this fixture must produce.
    #[must_use]
    pub fn expected(&self, mode: CacheMode) -> Summary {
        let mut first: HashMap<&str, (&Vec<String>, u64)> = HashMap::new();
        for row in &self.rows {
            first.entry(row[KEY].as_str()).or_insert((row, 0)).1 += 1;
        }
        let mut summary = Summary::new(mode);
        summary.total_rows = self.rows.len() as u64;
        summary.distinct_keys = first.len() as u64;
        for (row, count) in first.values() {
            if *count > 1 {
                summary.duplicated_key_rows += 1;
                summary.duplicated_key_occurrences += count;
            } else {
                summary.unique_key_rows += 1;
            }
            if row[FIRST].is_empty() || row[LAST].is_empty() {
                summary.missing_boundary_rows += 1;
            }
        }
        summary
    }

    /// Write the header and rows to `path` with the default dialect.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
        self.write_to(f)
    }

    /// Write the header and rows to any writer with the default dialect.
    ///
    /// # Errors
    /// Returns an error if a write fails.
    pub fn write_to<W: std::io::Write>(&self, w: W) -> Result<()> {
        let mut wtr = Dialect::default().writer_builder().from_writer(w);
        wtr.write_record(FIXTURE_HEADER)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Read an output file back as `(header, rows)`.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_output_rows(path: impl AsRef<Path>) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let path = path.as_ref();
    let mut rdr = Dialect::default()
        .reader_builder()
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut records = rdr.records();
    let header = match records.next() {
        Some(rec) => rec?.iter().map(str::to_owned).collect(),
        None => Vec::new(),
    };
    let rows = records
        .map(|rec| -> Result<Vec<String>> { Ok(rec?.iter().map(str::to_owned).collect()) })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("parse {}", path.display()))?;
    Ok((header, rows))
}

/// Assert that two row collections hold the same rows, ignoring order.
///
/// # Panics
///
/// Panics if the multisets differ.
pub fn assert_rows_unordered_equal<T: Ord + Clone + Debug>(actual: &[T], expected: &[T]) {
    let mut a = actual.to_vec();
    let mut e = expected.to_vec();
    a.sort();
    e.sort();
    assert_eq!(
        a.len(),
        e.len(),
        "Row count mismatch:\n  Expected: {}\n  Actual: {}",
        e.len(),
        a.len()
    );
    assert_eq!(a, e, "Rows differ (order ignored)");
}
