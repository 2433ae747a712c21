//! remora: DOLPHOT photometry to merged FITS catalogs
//!
//! Gzips the raw photometry of a field, converts each partition to a FITS
//! binary table with named columns and merges the partitions with RA/DEC.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use remora_phot::{run_field, FieldLayout, PipelineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "remora")]
#[command(about = "Convert DOLPHOT photometry of a field into merged FITS tables")]
#[command(version)]
struct Cli {
    /// Field name, e.g. M33-B01, or a path ending in it; files inside are
    /// named after the field
    field: PathBuf,

    /// JSON file overriding naming rules, selection or partition settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => PipelineConfig::default(),
    };
    let layout = FieldLayout::from_dir(&cli.field)?;

    run_field(&layout, &config)
        .with_context(|| format!("Failed to process field {}", layout.name()))?;
    Ok(())
}
