use super::{Drain, KeyAccumulator};
use crate::schema::Row;
use anyhow::Result;
use std::collections::HashMap;

/// Keeps every distinct key in a `HashMap`.
///
/// Memory grows with the number of distinct keys; there is no bound.
#[derive(Debug, Default)]
pub struct MemoryAccumulator {
    entries: HashMap<String, (Row, u64)>,
}

impl MemoryAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for a key, if it has been seen.
    #[must_use]
    pub fn count(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|(_, n)| *n)
    }
}

impl KeyAccumulator for MemoryAccumulator {
    fn record(&mut self, row: Row) -> Result<()> {
        let key = row.natural_key()?;
        if let Some((_, count)) = self.entries.get_mut(key) {
            *count += 1;
            return Ok(());
        }
        let key = key.to_owned();
        self.entries.insert(key, (row, 1));
        Ok(())
    }

    fn drain(&mut self) -> Result<Drain<'_>> {
        Ok(Box::new(self.entries.drain().map(|(_, entry)| Ok(entry))))
    }

    fn close(&mut self) -> Result<()> {
        self.entries = HashMap::new();
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use std::sync::Arc;

    fn row(schema: &Arc<Schema>, key: &str, page: &str) -> Row {
        Row::new(Arc::clone(schema), vec![key.into(), page.into()]).unwrap()
    }

    #[test]
    fn first_row_wins_and_counts_accumulate() -> Result<()> {
        let schema = Arc::new(Schema::from_header(["Chave Natural", "First Page"])?);
        let mut acc = MemoryAccumulator::new();
        acc.record(row(&schema, "k1", "first"))?;
        acc.record(row(&schema, "k2", "x"))?;
        acc.record(row(&schema, "k1", "second"))?;
        acc.record(row(&schema, "k1", "third"))?;

        assert_eq!(acc.len(), 2);
        assert_eq!(acc.count("k1"), Some(3));
        assert_eq!(acc.count("k3"), None);

        let mut drained = acc.drain()?.collect::<Result<Vec<_>>>()?;
        drained.sort_by(|a, b| a.0.fields().cmp(b.0.fields()));
        assert_eq!(drained[0].0.get("firstpage"), Some("first"));
        assert_eq!(drained[0].1, 3);
        assert_eq!(drained[1].1, 1);

        assert!(acc.is_empty());
        assert_eq!(acc.drain()?.count(), 0);
        Ok(())
    }

    #[test]
    fn close_is_idempotent() -> Result<()> {
        let schema = Arc::new(Schema::from_header(["Chave Natural", "First Page"])?);
        let mut acc = MemoryAccumulator::new();
        acc.record(row(&schema, "k1", "1"))?;
        acc.close()?;
        acc.close()?;
        assert!(acc.is_empty());
        Ok(())
    }

    #[test]
    fn rows_without_natural_key_are_rejected() -> Result<()> {
        let schema = Arc::new(Schema::from_header(["id", "First Page"])?);
        let mut acc = MemoryAccumulator::new();
        assert!(acc.record(row(&schema, "k1", "1")).is_err());
        Ok(())
    }
}
