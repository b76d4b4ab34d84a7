//! Lazy row reader over a delimited input.
//!
//! [`RecordReader`] reads the header on first use, then yields one [`Row`]
//! per data record. Blank records and records that repeat the header text
//! are skipped, so concatenated exports with repeated headers read cleanly.

use crate::config::Dialect;
use crate::error::ImportError;
use crate::io::compression::open_input;
use crate::schema::{Row, Schema};
use anyhow::{Context, Result, bail};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Iterator of [`Row`]s read from a delimited stream.
///
/// The iterator is fused on error: after a header or row failure it yields
/// `None`, and [`RecordReader::schema`] keeps failing.
///
/// ```
/// use keysplit::{Dialect, RecordReader};
///
/// let data = "Chave Natural,First Page,Last Page\nk1,1,9\n\nk2,,4\n";
/// let mut reader = RecordReader::new(data.as_bytes(), &Dialect::default());
/// assert_eq!(reader.schema()?.names()[0], "chavenatural");
///
/// let rows = reader.by_ref().collect::<anyhow::Result<Vec<_>>>()?;
/// assert_eq!(rows.len(), 2);
/// assert_eq!(reader.rows_read(), 2);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct RecordReader<R> {
    inner: csv::Reader<R>,
    schema: Option<Arc<Schema>>,
    record: StringRecord,
    rows_read: u64,
    failed: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R, dialect: &Dialect) -> Self {
        Self {
            inner: dialect.reader_builder().from_reader(reader),
            schema: None,
            record: StringRecord::new(),
            rows_read: 0,
            failed: false,
        }
    }

    /// The header layout, read from the first record and cached.
    ///
    /// # Errors
    /// [`ImportError::EmptyInput`] if the stream has no records, or any
    /// header normalization error from [`Schema::from_header`]. Once the
    /// header has failed, every later call fails without reading.
    pub fn schema(&mut self) -> Result<Arc<Schema>> {
        if let Some(schema) = &self.schema {
            return Ok(Arc::clone(schema));
        }
        if self.failed {
            bail!("input header could not be read");
        }
        let header = self.read_header();
        self.failed = header.is_err();
        let schema = header?;
        self.schema = Some(Arc::clone(&schema));
        Ok(schema)
    }

    fn read_header(&mut self) -> Result<Arc<Schema>> {
        let mut header = StringRecord::new();
        if !self
            .inner
            .read_record(&mut header)
            .context("read header record")?
        {
            return Err(ImportError::EmptyInput.into());
        }
        Ok(Arc::new(Schema::from_header(header.iter())?))
    }

    /// Number of data rows yielded so far.
    #[must_use]
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        let schema = self.schema()?;
        loop {
            let more = self
                .inner
                .read_record(&mut self.record)
                .with_context(|| format!("read record after row {}", self.rows_read))?;
            if !more {
                return Ok(None);
            }
            if is_blank(&self.record) || schema.is_header(self.record.iter()) {
                continue;
            }
            let line = self.record.position().map_or(0, csv::Position::line);
            let (expected, found) = (schema.len(), self.record.len());
            let fields = self.record.iter().map(str::to_owned).collect();
            let Some(row) = Row::new(schema, fields) else {
                return Err(ImportError::MalformedRow {
                    line,
                    expected,
                    found,
                }
                .into());
            };
            self.rows_read += 1;
            return Ok(Some(row));
        }
    }
}

impl RecordReader<Box<dyn Read>> {
    /// Open a file, decompressing it if it is gzip or zstd.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn from_path(path: impl AsRef<Path>, dialect: &Dialect) -> Result<Self> {
        Ok(Self::new(open_input(path)?, dialect))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_row().transpose();
        self.failed = matches!(item, Some(Err(_)));
        item
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.is_empty() || (record.len() == 1 && record[0].is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &'static str) -> RecordReader<&'static [u8]> {
        RecordReader::new(data.as_bytes(), &Dialect::default())
    }

    #[test]
    fn schema_is_read_once() -> Result<()> {
        let mut r = reader("Chave Natural,First Page,Last Page\nk1,1,2\n");
        let a = r.schema()?;
        let b = r.schema()?;
        assert!(Arc::ptr_eq(&a, &b));
        let row = r.next().transpose()?.map(Row::into_fields);
        assert_eq!(row, Some(vec!["k1".to_string(), "1".to_string(), "2".to_string()]));
        Ok(())
    }

    #[test]
    fn skips_repeated_header() -> Result<()> {
        let mut r = reader("a,b\n1,2\na,b\n3,4\n");
        let rows = r.by_ref().collect::<Result<Vec<_>>>()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(r.rows_read(), 2);
        Ok(())
    }

    #[test]
    fn field_count_mismatch_is_malformed() {
        let mut r = reader("a,b\n1,2\n3\n");
        assert!(r.next().unwrap().is_ok());
        let err = r.next().unwrap().unwrap_err();
        match err.downcast_ref::<ImportError>() {
            Some(ImportError::MalformedRow {
                line,
                expected,
                found,
            }) => {
                assert_eq!((*line, *expected, *found), (3, 2, 1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_input_has_no_schema() {
        let mut r = reader("");
        let err = r.next().unwrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::EmptyInput)
        ));
    }

    #[test]
    fn empty_input_ends_after_error() {
        let mut r = reader("");
        assert!(r.next().is_some_and(|item| item.is_err()));
        assert!(r.next().is_none());
        assert_eq!(reader("").filter_map(Result::ok).count(), 0);
    }

    #[test]
    fn bad_header_is_not_retried_on_data_rows() {
        let mut r = reader("A,a\nx,y\nk1,k2\n");
        let err = r.next().unwrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::DuplicateField { .. })
        ));
        assert!(r.next().is_none());
        assert!(r.schema().is_err());
        assert_eq!(r.rows_read(), 0);
    }

    #[test]
    fn stops_after_malformed_row() {
        let mut r = reader("a,b\n1\n3,4\n");
        assert!(r.next().unwrap().is_err());
        assert!(r.next().is_none());
    }

    #[test]
    fn header_only_yields_nothing() -> Result<()> {
        let mut r = reader("a,b\n");
        assert!(r.next().is_none());
        assert_eq!(r.rows_read(), 0);
        Ok(())
    }

    #[test]
    fn quoted_fields_keep_delimiters() -> Result<()> {
        let mut r = reader("a,b\n\"x, y\",\"say \"\"hi\"\"\"\n");
        let row = r.next().unwrap()?;
        assert_eq!(row.get("a"), Some("x, y"));
        assert_eq!(row.get("b"), Some("say \"hi\""));
        Ok(())
    }

    #[test]
    fn custom_delimiter() -> Result<()> {
        let dialect = Dialect {
            delimiter: b';',
            ..Dialect::default()
        };
        let mut r = RecordReader::new("a;b\n1;2\n".as_bytes(), &dialect);
        assert_eq!(r.next().unwrap()?.get("b"), Some("2"));
        Ok(())
    }
}
