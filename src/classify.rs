//! Routing of accumulated rows to the three output partitions.
//!
//! Two independent rules are applied to every `(row, count)` pair:
//!
//! - **duplication**: `count > 1` goes to [`Partition::DuplicatedKey`],
//!   `count == 1` to [`Partition::SingleKey`]
//! - **missing boundary**: an empty `firstpage` or `lastpage` also sends the
//!   row to [`Partition::MissingBoundary`]
//!
//! A row can therefore land in two outputs.

use crate::config::{CacheMode, Dialect};
use crate::io::{OutputWriter, create_output};
use crate::schema::{FIRST_PAGE, LAST_PAGE, Row, Schema};
use crate::summary::Summary;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// One of the three output files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Rows with an empty first page or last page.
    MissingBoundary,
    /// Rows whose natural key occurs once.
    SingleKey,
    /// Representative rows of natural keys that occur more than once.
    DuplicatedKey,
}

impl Partition {
    pub const ALL: [Self; 3] = [Self::MissingBoundary, Self::SingleKey, Self::DuplicatedKey];

    /// Output file name, relative to the output directory.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::MissingBoundary => "without_first_last.csv",
            Self::SingleKey => "single_key.csv",
            Self::DuplicatedKey => "duplicated_key.csv",
        }
    }
}

/// Partitions a single pair belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Route {
    /// Result of the duplication rule; `None` only for a zero count.
    pub by_count: Option<Partition>,
    pub missing_boundary: bool,
}

impl Route {
    #[must_use]
    pub fn of(row: &Row, count: u64) -> Self {
        let by_count = match count {
            0 => None,
            1 => Some(Partition::SingleKey),
            _ => Some(Partition::DuplicatedKey),
        };
        Self {
            by_count,
            missing_boundary: row.is_blank(FIRST_PAGE) || row.is_blank(LAST_PAGE),
        }
    }

    pub fn partitions(self) -> impl Iterator<Item = Partition> {
        self.by_count
            .into_iter()
            .chain(self.missing_boundary.then_some(Partition::MissingBoundary))
    }
}

/// Writes drained pairs to the three outputs and keeps the counters.
pub struct Classifier<W: Write = std::fs::File> {
    missing: csv::Writer<W>,
    single: csv::Writer<W>,
    duplicated: csv::Writer<W>,
    summary: Summary,
}

impl Classifier<std::fs::File> {
    /// Create (or truncate) the three output files in `output_dir`.
    ///
    /// # Errors
    /// Returns an error if any file cannot be created.
    pub fn create(output_dir: &Path, dialect: &Dialect, mode: CacheMode) -> Result<Self> {
        let open = |p: Partition| -> Result<OutputWriter> {
            create_output(output_dir.join(p.file_name()), dialect)
        };
        Ok(Self::new(
            open(Partition::MissingBoundary)?,
            open(Partition::SingleKey)?,
            open(Partition::DuplicatedKey)?,
            mode,
        ))
    }
}

impl<W: Write> Classifier<W> {
    pub fn new(
        missing: csv::Writer<W>,
        single: csv::Writer<W>,
        duplicated: csv::Writer<W>,
        mode: CacheMode,
    ) -> Self {
        Self {
            missing,
            single,
            duplicated,
            summary: Summary::new(mode),
        }
    }

    fn writer(&mut self, partition: Partition) -> &mut csv::Writer<W> {
        match partition {
            Partition::MissingBoundary => &mut self.missing,
            Partition::SingleKey => &mut self.single,
            Partition::DuplicatedKey => &mut self.duplicated,
        }
    }

    /// Write the input header to all three outputs. Call once, before any row.
    ///
    /// # Errors
    /// Returns an error if a write fails.
    pub fn write_headers(&mut self, schema: &Schema) -> Result<()> {
        for p in Partition::ALL {
            self.writer(p)
                .write_record(schema.columns())
                .with_context(|| format!("write header to {}", p.file_name()))?;
        }
        Ok(())
    }

    /// Count and write one drained pair.
    ///
    /// # Errors
    /// Returns an error if a write fails.
    pub fn dispatch(&mut self, row: &Row, count: u64) -> Result<Route> {
        let route = Route::of(row, count);
        match route.by_count {
            Some(Partition::DuplicatedKey) => {
                self.summary.distinct_keys += 1;
                self.summary.duplicated_key_rows += 1;
                self.summary.duplicated_key_occurrences += count;
            }
            Some(Partition::SingleKey) => {
                self.summary.distinct_keys += 1;
                self.summary.unique_key_rows += 1;
            }
            _ => {}
        }
        if route.missing_boundary {
            self.summary.missing_boundary_rows += 1;
        }
        for p in route.partitions() {
            self.writer(p)
                .write_record(row.fields())
                .with_context(|| format!("write row to {}", p.file_name()))?;
        }
        Ok(route)
    }

    /// Flush all outputs and hand back the counters.
    ///
    /// # Errors
    /// Returns an error if a flush fails.
    pub fn finish(mut self) -> Result<Summary> {
        for p in Partition::ALL {
            self.writer(p)
                .flush()
                .with_context(|| format!("flush {}", p.file_name()))?;
        }
        Ok(self.summary)
    }

    /// Flush and return the underlying writers, in [`Partition::ALL`] order.
    ///
    /// # Errors
    /// Returns an error if a writer cannot be flushed.
    pub fn into_inner(self) -> Result<(Summary, [W; 3])> {
        let Self {
            missing,
            single,
            duplicated,
            summary,
        } = self;
        let inner = |w: csv::Writer<W>| w.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()));
        Ok((summary, [inner(missing)?, inner(single)?, inner(duplicated)?]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::from_header(["Chave Natural", "First Page", "Last Page"]).unwrap())
    }

    fn row(schema: &Arc<Schema>, fields: [&str; 3]) -> Row {
        Row::new(Arc::clone(schema), fields.map(String::from).to_vec()).unwrap()
    }

    fn classifier() -> Classifier<Vec<u8>> {
        let w = || Dialect::default().writer_builder().from_writer(Vec::new());
        Classifier::new(w(), w(), w(), CacheMode::Memory)
    }

    #[test]
    fn routes_are_independent() {
        let s = schema();
        assert_eq!(
            Route::of(&row(&s, ["k", "1", "2"]), 1).partitions().collect::<Vec<_>>(),
            vec![Partition::SingleKey]
        );
        assert_eq!(
            Route::of(&row(&s, ["k", "", "2"]), 3).partitions().collect::<Vec<_>>(),
            vec![Partition::DuplicatedKey, Partition::MissingBoundary]
        );
        assert_eq!(
            Route::of(&row(&s, ["k", "1", ""]), 1).partitions().collect::<Vec<_>>(),
            vec![Partition::SingleKey, Partition::MissingBoundary]
        );
        assert!(!Route::of(&row(&s, ["k", " ", "0"]), 1).missing_boundary);
    }

    #[test]
    fn dispatch_counts_and_writes() -> Result<()> {
        let s = schema();
        let mut c = classifier();
        c.write_headers(&s)?;
        c.dispatch(&row(&s, ["a", "1", "2"]), 1)?;
        c.dispatch(&row(&s, ["b", "", "2"]), 4)?;
        c.dispatch(&row(&s, ["c", "1", ""]), 1)?;

        let (summary, [missing, single, duplicated]) = c.into_inner()?;
        assert_eq!(summary.distinct_keys, 3);
        assert_eq!(summary.unique_key_rows, 2);
        assert_eq!(summary.duplicated_key_rows, 1);
        assert_eq!(summary.duplicated_key_occurrences, 4);
        assert_eq!(summary.missing_boundary_rows, 2);

        let text = |b: Vec<u8>| String::from_utf8(b).unwrap();
        assert_eq!(
            text(missing),
            "Chave Natural,First Page,Last Page\r\nb,,2\r\nc,1,\r\n"
        );
        assert_eq!(
            text(single),
            "Chave Natural,First Page,Last Page\r\na,1,2\r\nc,1,\r\n"
        );
        assert_eq!(
            text(duplicated),
            "Chave Natural,First Page,Last Page\r\nb,,2\r\n"
        );
        Ok(())
    }

    #[test]
    fn zero_count_is_not_a_key() -> Result<()> {
        let s = schema();
        let mut c = classifier();
        let route = c.dispatch(&row(&s, ["z", "1", "2"]), 0)?;
        assert_eq!(route.partitions().count(), 0);
        let (summary, _) = c.into_inner()?;
        assert_eq!(summary.distinct_keys, 0);
        assert_eq!(
            summary.distinct_keys,
            summary.unique_key_rows + summary.duplicated_key_rows
        );
        Ok(())
    }

    #[test]
    fn headers_without_rows() -> Result<()> {
        let mut c = classifier();
        c.write_headers(&schema())?;
        let (summary, outputs) = c.into_inner()?;
        assert_eq!(summary, Summary::new(CacheMode::Memory));
        for out in outputs {
            assert_eq!(out, b"Chave Natural,First Page,Last Page\r\n");
        }
        Ok(())
    }
}
