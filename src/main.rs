//! keysplit CLI
//!
//! Splits a delimited file by natural key into `single_key.csv`,
//! `duplicated_key.csv` and `without_first_last.csv`.

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser};
use keysplit::{CacheMode, ImportConfig, Importer};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

#[derive(Parser)]
#[command(name = "keysplit")]
#[command(about = "Split a CSV file by natural key", long_about = None)]
#[command(group(ArgGroup::new("cache").args(["in_memory", "in_disk"])))]
struct Cli {
    /// Path to the input file (plain, gzip or zstd)
    #[arg(long)]
    csv_path: PathBuf,

    /// Keep the key cache in RAM (default)
    #[arg(long)]
    in_memory: bool,

    /// Keep the key cache in an on-disk store
    #[arg(long)]
    in_disk: bool,

    /// Directory the three output files are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Field delimiter, a single ASCII character
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// Location of the on-disk cache store
    #[arg(long, default_value = "cache")]
    cache_path: PathBuf,

    /// Log file; `-` logs to stderr
    #[arg(long, default_value = "keysplit.log")]
    log_file: String,

    /// Also write the final counters as JSON
    #[arg(long)]
    stats_json: Option<PathBuf>,
}

impl Cli {
    fn mode(&self) -> CacheMode {
        if self.in_disk {
            CacheMode::Disk
        } else {
            CacheMode::Memory
        }
    }

    fn delimiter(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => bail!("delimiter must be a single ASCII character, got {:?}", self.delimiter),
        }
    }
}

fn init_logging(log_file: &str) -> Result<()> {
    let writer = if log_file == "-" {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        let file = File::options()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("open log file {log_file}"))?;
        BoxMakeWriter::new(Mutex::new(file))
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_writer(writer)
        .with_ansi(log_file == "-")
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let mut config = ImportConfig {
        output_dir: cli.output_dir.clone(),
        cache_path: cli.cache_path.clone(),
        ..ImportConfig::new(&cli.csv_path, cli.mode())
    };
    config.dialect.delimiter = cli.delimiter()?;

    info!(input = %cli.csv_path.display(), mode = %config.mode, "starting import");
    let summary = Importer::new(config)?.run()?;

    if let Some(path) = &cli.stats_json {
        summary.save_to_file(path)?;
        info!(path = %path.display(), "wrote stats");
    }
    Ok(())
}
