//! The two-pass run.
//!
//! ```text
//! Idle --run()--> Accumulating --input exhausted--> Reporting --drained--> Done
//! ```
//!
//! Pass 1 feeds every input row to the accumulator. Pass 2 drains it through
//! the [`Classifier`] and reports the counters. An importer runs once; a
//! second [`Importer::run`] fails with [`ImportError::AlreadyRun`].

use crate::accumulator::open_accumulator;
use crate::classify::Classifier;
use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::io::reader::RecordReader;
use crate::report::{Reporter, TracingReporter};
use crate::summary::Summary;
use anyhow::{Context, Result};
use tracing::debug;

const PROGRESS_EVERY: u64 = 100_000;

/// Phase of an [`Importer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportState {
    /// Constructed, not yet run.
    Idle,
    /// Pass 1: counting rows per key.
    Accumulating,
    /// Pass 2: classifying drained keys and writing outputs.
    Reporting,
    /// Finished successfully.
    Done,
}

/// Drives one import of one input file.
///
/// ```no_run
/// use keysplit::{CacheMode, ImportConfig, Importer};
///
/// # fn main() -> anyhow::Result<()> {
/// let mut importer = Importer::new(ImportConfig::new("fascicles.csv", CacheMode::Disk))?;
/// let summary = importer.run()?;
/// println!("{} rows, {} duplicated keys", summary.total_rows, summary.duplicated_key_rows);
/// # Ok(())
/// # }
/// ```
pub struct Importer<P: Reporter = TracingReporter> {
    config: ImportConfig,
    reporter: P,
    state: ImportState,
}

impl Importer<TracingReporter> {
    /// Importer that reports through `tracing`.
    ///
    /// # Errors
    /// [`ImportError::InvalidInputPath`] if the input path is unusable.
    pub fn new(config: ImportConfig) -> Result<Self> {
        Self::with_reporter(config, TracingReporter)
    }
}

impl<P: Reporter> Importer<P> {
    /// Importer with a custom reporter. The input path is checked here,
    /// before any file is opened.
    ///
    /// # Errors
    /// [`ImportError::InvalidInputPath`] if the input path is unusable.
    pub fn with_reporter(config: ImportConfig, reporter: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reporter,
            state: ImportState::Idle,
        })
    }

    #[must_use]
    pub fn state(&self) -> ImportState {
        self.state
    }

    /// Run both passes and return the final counters.
    ///
    /// The input, the three outputs and the accumulator are released on every
    /// path out of this function. Outputs are not rolled back on failure.
    ///
    /// # Errors
    /// Configuration errors (missing required fields, second run), malformed
    /// input, and any I/O or store failure.
    pub fn run(&mut self) -> Result<Summary> {
        if self.state != ImportState::Idle {
            return Err(ImportError::AlreadyRun.into());
        }
        let config = &self.config;

        let mut reader = RecordReader::from_path(&config.input, &config.dialect)?;
        let mut classifier = Classifier::create(&config.output_dir, &config.dialect, config.mode)?;
        let schema = reader
            .schema()
            .with_context(|| format!("read header of {}", config.input.display()))?;
        schema.require_fields()?;
        classifier.write_headers(&schema)?;
        let mut accumulator = open_accumulator(config.mode, &config.cache_path, &schema)?;

        self.state = ImportState::Accumulating;
        debug!(input = %config.input.display(), mode = %config.mode, "accumulating");
        for (n, row) in (1u64..).zip(reader.by_ref()) {
            accumulator.record(row?)?;
            if n % PROGRESS_EVERY == 0 {
                debug!(rows = n, keys = accumulator.len(), "accumulating");
            }
        }
        let total_rows = reader.rows_read();

        self.state = ImportState::Reporting;
        debug!(rows = total_rows, keys = accumulator.len(), "classifying");
        for entry in accumulator.drain()? {
            let (row, count) = entry?;
            classifier.dispatch(&row, count)?;
        }
        accumulator.close()?;

        let mut summary = classifier.finish()?;
        summary.total_rows = total_rows;
        summary.report_to(&mut self.reporter);
        self.state = ImportState::Done;
        Ok(summary)
    }
}
