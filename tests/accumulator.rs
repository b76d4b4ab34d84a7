use anyhow::Result;
use keysplit::{CacheMode, KeyAccumulator, Row, Schema, open_accumulator};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

fn schema() -> Arc<Schema> {
    Arc::new(Schema::from_header(["Chave Natural", "First Page", "Last Page"]).unwrap())
}

fn rows(schema: &Arc<Schema>) -> Vec<Row> {
    // 40 keys, key i seen (i % 4) + 1 times, interleaved.
    let mut rows = Vec::new();
    for round in 0..4 {
        for i in 0..40 {
            if round <= i % 4 {
                let fields = vec![format!("k{i:03}"), round.to_string(), "10".to_string()];
                rows.push(Row::new(Arc::clone(schema), fields).unwrap());
            }
        }
    }
    rows
}

fn drain_all(acc: &mut dyn KeyAccumulator) -> Result<HashMap<String, (String, u64)>> {
    let mut seen = HashMap::new();
    for entry in acc.drain()? {
        let (row, count) = entry?;
        let key = row.natural_key()?.to_string();
        let first = row.get("firstpage").unwrap_or_default().to_string();
        assert!(seen.insert(key, (first, count)).is_none(), "key drained twice");
    }
    Ok(seen)
}

fn check_backend(mode: CacheMode, cache: &Path) -> Result<()> {
    let schema = schema();
    let input = rows(&schema);
    let total = input.len() as u64;

    let mut acc = open_accumulator(mode, cache, &schema)?;
    assert!(acc.is_empty());
    for row in input {
        acc.record(row)?;
    }
    assert_eq!(acc.len(), 40);

    let entries = drain_all(acc.as_mut())?;
    assert_eq!(entries.len(), 40);
    assert_eq!(entries.values().map(|(_, c)| c).sum::<u64>(), total);
    for (key, (first, count)) in &entries {
        let i: u64 = key[1..].parse()?;
        assert_eq!(*count, i % 4 + 1, "count for {key}");
        assert_eq!(first, "0", "representative for {key} is not the first row");
    }

    assert!(drain_all(acc.as_mut())?.is_empty());
    acc.close()?;
    acc.close()?;
    Ok(())
}

#[test]
fn memory_backend_counts_every_occurrence() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    check_backend(CacheMode::Memory, &tmp.path().join("cache"))
}

#[cfg(feature = "disk-cache")]
#[test]
fn disk_backend_counts_every_occurrence() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cache = tmp.path().join("cache");
    check_backend(CacheMode::Disk, &cache)?;
    assert!(!cache.exists());
    Ok(())
}

#[cfg(feature = "disk-cache")]
#[test]
fn disk_store_removed_on_drop() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cache = tmp.path().join("cache");
    let schema = schema();
    {
        let mut acc = open_accumulator(CacheMode::Disk, &cache, &schema)?;
        for row in rows(&schema) {
            acc.record(row)?;
        }
        assert!(cache.exists());
    }
    assert!(!cache.exists());
    Ok(())
}

#[cfg(not(feature = "disk-cache"))]
#[test]
fn disk_mode_needs_feature() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(open_accumulator(CacheMode::Disk, tmp.path(), &schema()).is_err());
}
