//! Transparent decompression of the input file.
//!
//! Large exports are often shipped compressed. [`open_input`] checks the file
//! extension first and falls back to the stream's magic bytes, so a gzip file
//! named `fascicles.csv` is still read correctly.
//!
//! Built-in codecs, each behind a feature flag:
//! - **Gzip** (`.gz`) - via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`) - via `zstd` (feature: `compression-zstd`)
//!
//! With no codec features enabled the input is read as plain text.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A decompression algorithm recognised by extension or signature.
pub trait Codec: Send + Sync {
    /// Human-readable codec name (e.g. "gzip").
    fn name(&self) -> &'static str;

    /// Lowercase extensions with the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Signature at the start of the stream.
    fn magic_bytes(&self) -> &'static [u8];

    /// Wrap a reader so it yields decompressed bytes.
    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;
}

const CODECS: &[&dyn Codec] = &[
    #[cfg(feature = "compression-gzip")]
    &GzipCodec,
    #[cfg(feature = "compression-zstd")]
    &ZstdCodec,
];

fn detect_from_extension(path: &Path) -> Option<&'static dyn Codec> {
    let name = path.to_string_lossy().to_lowercase();
    CODECS
        .iter()
        .copied()
        .find(|c| c.extensions().iter().any(|ext| name.ends_with(ext)))
}

fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<&'static dyn Codec> {
    let buf = reader.fill_buf().ok()?;
    CODECS
        .iter()
        .copied()
        .find(|c| buf.starts_with(c.magic_bytes()))
}

/// Name of the codec that [`open_input`] would use for `path`, if any.
///
/// # Errors
/// Returns an error if the file cannot be opened.
pub fn detect_codec(path: impl AsRef<Path>) -> Result<Option<&'static str>> {
    let path = path.as_ref();
    if let Some(codec) = detect_from_extension(path) {
        return Ok(Some(codec.name()));
    }
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    Ok(detect_from_magic(&mut BufReader::new(f)).map(|c| c.name()))
}

/// Open `path` for reading, decompressing on the fly when a codec matches.
///
/// # Errors
/// Returns an error if the file cannot be opened or the decoder cannot be set up.
pub fn open_input(path: impl AsRef<Path>) -> Result<Box<dyn Read>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;

    if let Some(codec) = detect_from_extension(path) {
        return codec
            .wrap_reader(Box::new(f))
            .with_context(|| format!("set up {} decoder for {}", codec.name(), path.display()));
    }

    let mut buffered = BufReader::new(f);
    if let Some(codec) = detect_from_magic(&mut buffered) {
        return codec
            .wrap_reader(Box::new(buffered))
            .with_context(|| format!("set up {} decoder for {}", codec.name(), path.display()));
    }
    Ok(Box::new(buffered))
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl Codec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> &'static [u8] {
        &[0x1f, 0x8b]
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        // Multi-member so concatenated gzip files read to the end.
        Ok(Box::new(flate2::read::MultiGzDecoder::new(reader)))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl Codec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> &'static [u8] {
        &[0x28, 0xb5, 0x2f, 0xfd]
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }
}
