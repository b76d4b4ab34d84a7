use super::{Drain, KeyAccumulator};
use crate::error::ImportError;
use crate::schema::{Row, Schema};
use anyhow::{Context, Result, anyhow, bail};
use rocksdb::{DB, DBRawIterator, Options, WriteOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Value stored per key: the representative row's fields and the count.
type StoredEntry = (Vec<String>, u64);

/// Keeps every distinct key in an embedded RocksDB store.
///
/// Keys are the natural key's UTF-8 bytes; values are postcard-encoded
/// `(fields, count)`. A repeated key costs a full read, decode, re-encode and
/// write of its value.
///
/// Writes skip the write-ahead log and are never synced, so the store is only
/// consistent while this process holds it. Any existing store at the path is
/// destroyed on open and the directory is removed again on close.
pub struct DiskAccumulator {
    db: Option<DB>,
    path: PathBuf,
    schema: Arc<Schema>,
    write_opts: WriteOptions,
    keys: usize,
    drained: bool,
}

fn store_options() -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.set_use_fsync(false);
    opts.set_paranoid_checks(false);
    opts.set_write_buffer_size(64 * 1024 * 1024);
    opts
}

impl DiskAccumulator {
    /// Create a fresh store at `path`; rows are rebuilt against `schema` on drain.
    ///
    /// # Errors
    /// Fails if a stale store cannot be removed or the store cannot be opened.
    pub fn open(path: impl AsRef<Path>, schema: Arc<Schema>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let opts = store_options();
        if path.exists() {
            DB::destroy(&opts, &path)
                .with_context(|| format!("remove stale store at {}", path.display()))?;
        }
        let db = DB::open(&opts, &path)
            .with_context(|| format!("open accumulator store at {}", path.display()))?;

        let mut write_opts = WriteOptions::default();
        write_opts.disable_wal(true);
        write_opts.set_sync(false);

        debug!(path = %path.display(), "opened accumulator store");
        Ok(Self {
            db: Some(db),
            path,
            schema,
            write_opts,
            keys: 0,
            drained: false,
        })
    }

    /// Current count for a key, if it has been seen.
    ///
    /// # Errors
    /// Fails if the store is closed or the entry cannot be decoded.
    pub fn count(&self, key: &str) -> Result<Option<u64>> {
        let Some(db) = &self.db else {
            bail!("accumulator store is closed");
        };
        match db.get(key.as_bytes()).context("read accumulator entry")? {
            Some(bytes) => Ok(Some(decode(key.as_bytes(), &bytes)?.1)),
            None => Ok(None),
        }
    }
}

impl KeyAccumulator for DiskAccumulator {
    fn record(&mut self, row: Row) -> Result<()> {
        let Some(db) = &self.db else {
            bail!("accumulator store is closed");
        };
        let key = row.natural_key()?.as_bytes();
        let value = match db.get(key).context("read accumulator entry")? {
            Some(bytes) => {
                let (fields, count) = decode(key, &bytes)?;
                encode(&(fields, count + 1))?
            }
            None => {
                self.keys += 1;
                encode(&(row.fields(), 1u64))?
            }
        };
        db.put_opt(key, value, &self.write_opts)
            .context("write accumulator entry")
    }

    fn drain(&mut self) -> Result<Drain<'_>> {
        let Some(db) = &self.db else {
            bail!("accumulator store is closed");
        };
        if self.drained {
            return Ok(Box::new(std::iter::empty()));
        }
        self.drained = true;
        self.keys = 0;

        let mut iter = db.raw_iterator();
        iter.seek_to_first();
        Ok(Box::new(DiskDrain {
            iter,
            schema: Arc::clone(&self.schema),
            failed: false,
        }))
    }

    fn close(&mut self) -> Result<()> {
        let Some(db) = self.db.take() else {
            return Ok(());
        };
        drop(db);
        self.keys = 0;
        DB::destroy(&Options::default(), &self.path)
            .with_context(|| format!("remove accumulator store at {}", self.path.display()))?;
        debug!(path = %self.path.display(), "removed accumulator store");
        Ok(())
    }

    fn len(&self) -> usize {
        self.keys
    }
}

impl Drop for DiskAccumulator {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("failed to close accumulator store: {err:#}");
        }
    }
}

/// Walks the store in key order: seek to the first key, then step to the next.
struct DiskDrain<'a> {
    iter: DBRawIterator<'a>,
    schema: Arc<Schema>,
    failed: bool,
}

impl Iterator for DiskDrain<'_> {
    type Item = Result<(Row, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if !self.iter.valid() {
            return self.iter.status().err().map(|err| {
                self.failed = true;
                Err(anyhow::Error::new(err).context("walk accumulator store"))
            });
        }
        let (key, value) = (self.iter.key()?, self.iter.value()?);
        let item = decode(key, value).and_then(|(fields, count)| {
            let row = Row::new(Arc::clone(&self.schema), fields).ok_or_else(|| {
                corrupt(key, "field count does not match the header".to_string())
            })?;
            Ok((row, count))
        });
        self.failed = item.is_err();
        self.iter.next();
        Some(item)
    }
}

fn encode<T: serde::Serialize>(entry: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(entry).map_err(|e| anyhow!("encode accumulator entry: {e}"))
}

fn decode(key: &[u8], bytes: &[u8]) -> Result<StoredEntry> {
    postcard::from_bytes(bytes).map_err(|e| corrupt(key, e.to_string()).into())
}

fn corrupt(key: &[u8], reason: String) -> ImportError {
    ImportError::CorruptEntry {
        key: String::from_utf8_lossy(key).into_owned(),
        reason,
    }
}
