//! The three steps run for a field: compress raw photometry, convert each
//! partition to a table file, merge the partitions.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, info};

use crate::columns::ColumnTable;
use crate::config::PipelineConfig;
use crate::error::{PhotError, Result};
use crate::fits;
use crate::layout::{temp_path, FieldLayout};
use crate::loader::load_table;
use crate::merge::{merge_field, MergeOutput};
use crate::select::select_columns;

const RAW_EXTENSION: &str = "phot";

/// Gzips every `*.phot` file in the field directory, replacing each with
/// its `.phot.gz`. Returns the compressed paths.
pub fn compress_raw(layout: &FieldLayout) -> Result<Vec<PathBuf>> {
    let dir = layout.dir();
    let entries = fs::read_dir(&dir).map_err(|e| PhotError::io(&dir, e))?;

    let mut raw = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PhotError::io(&dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == RAW_EXTENSION) {
            raw.push(path);
        }
    }
    raw.sort();

    let mut compressed = Vec::with_capacity(raw.len());
    for path in raw {
        compressed.push(gzip_file(&path)?);
    }
    info!("Compressed {} raw files in {:?}", compressed.len(), dir);
    Ok(compressed)
}

fn gzip_file(path: &Path) -> Result<PathBuf> {
    let mut target = path.as_os_str().to_owned();
    target.push(".gz");
    let target = PathBuf::from(target);
    let temp = temp_path(&target);

    let write = || -> io::Result<()> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut encoder = GzEncoder::new(BufWriter::new(File::create(&temp)?), Compression::default());
        io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
        Ok(())
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&temp);
        return Err(PhotError::compression(path, e));
    }

    fs::rename(&temp, &target).map_err(|e| PhotError::io(&target, e))?;
    fs::remove_file(path).map_err(|e| PhotError::io(path, e))?;
    debug!("Compressed {:?} -> {:?}", path, target);
    Ok(target)
}

/// Resolves, selects and loads partition `partition`, then writes its
/// table file.
pub fn convert_partition(layout: &FieldLayout, partition: usize, config: &PipelineConfig) -> Result<PathBuf> {
    let columns = ColumnTable::from_path(layout.columns_path(partition), &config.naming)?;
    let selection = select_columns(&columns, &config.selection)?;

    let compressed = layout.compressed_path(partition);
    let source = if compressed.exists() {
        compressed
    } else {
        layout.raw_path(partition)
    };
    let table = load_table(&source, &columns, &selection)?;
    info!(
        "Partition {}: {} stars, {} of {} columns selected",
        partition,
        table.nrows(),
        selection.len(),
        columns.len()
    );

    let out = layout.partition_table_path(partition);
    fits::write_table(&out, &table)?;
    Ok(out)
}

/// Runs every step for a field and returns the merged table file.
pub fn run_field(layout: &FieldLayout, config: &PipelineConfig) -> Result<PathBuf> {
    config.validate()?;
    info!("Processing field {} in {:?}", layout.name(), layout.dir());

    compress_raw(layout)?;
    for partition in 1..=config.partitions {
        let path = convert_partition(layout, partition, config)?;
        println!("Written {}", path.display());
    }

    match merge_field(layout, config, true)? {
        MergeOutput::Written(path) => Ok(path),
        MergeOutput::Table(_) => Ok(layout.merged_table_path()),
    }
}
