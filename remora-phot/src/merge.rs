//! Merging of the column-partitioned catalogs DOLPHOT produces for one
//! field.
//!
//! Neighbouring partitions overlap in X. Each boundary sits halfway
//! between the right edge of one partition and the left edge of the next,
//! and every partition keeps only the stars it owns: `lower <= X < upper`.

use std::path::PathBuf;

use remora_wcs::Wcs;
use tracing::{debug, info};

use crate::augment::{add_wcs, load_wcs};
use crate::config::PipelineConfig;
use crate::error::{PhotError, Result};
use crate::fits;
use crate::layout::FieldLayout;
use crate::table::PhotTable;

/// Result of [`merge_field`].
#[derive(Debug)]
pub enum MergeOutput {
    Written(PathBuf),
    Table(PhotTable),
}

/// X position separating `left` from `right`, rounded half to even.
pub fn partition_boundary(left: &PhotTable, right: &PhotTable) -> Result<f64> {
    let left_max = left
        .max("X")
        .ok_or_else(|| PhotError::format("left partition has no X values"))?;
    let right_min = right
        .min("X")
        .ok_or_else(|| PhotError::format("right partition has no X values"))?;
    Ok(((right_min + left_max) / 2.0).round_ties_even())
}

/// Concatenates the owned rows of each partition, in order, and adds
/// RA/DEC.
pub fn merge_partitions(partitions: &[PhotTable], wcs: &Wcs) -> Result<PhotTable> {
    if partitions.is_empty() {
        return Err(PhotError::format("no partitions to merge"));
    }
    for part in partitions {
        part.require_column("X")?;
    }

    let boundaries = partitions
        .windows(2)
        .map(|pair| partition_boundary(&pair[0], &pair[1]))
        .collect::<Result<Vec<f64>>>()?;
    debug!("Partition boundaries in X: {:?}", boundaries);

    let owned: Vec<PhotTable> = partitions
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let lower = if i == 0 { f64::NEG_INFINITY } else { boundaries[i - 1] };
            let upper = boundaries.get(i).copied().unwrap_or(f64::INFINITY);
            let xs = part.column("X").unwrap_or_default();
            let kept = part.filter_rows(|row| matches!(xs[row], Some(x) if lower <= x && x < upper));
            debug!(
                "Partition {}: keeping {} of {} rows",
                i + 1,
                kept.nrows(),
                part.nrows()
            );
            kept
        })
        .collect();

    let merged = PhotTable::concat(&owned)?;
    add_wcs(merged, wcs)
}

/// Merges the partition tables of a field and either writes the result
/// next to them or hands it back.
pub fn merge_field(layout: &FieldLayout, config: &PipelineConfig, export: bool) -> Result<MergeOutput> {
    let partitions = (1..=config.partitions)
        .map(|i| fits::read_table(layout.partition_table_path(i)))
        .collect::<Result<Vec<_>>>()?;
    let wcs = load_wcs(layout.wcs_path(&config.wcs_filter))?;

    let merged = merge_partitions(&partitions, &wcs)?;
    info!(
        "Merged {} partitions of {} into {} rows",
        partitions.len(),
        layout.name(),
        merged.nrows()
    );

    if !export {
        return Ok(MergeOutput::Table(merged));
    }

    let path = layout.merged_table_path();
    fits::write_table(&path, &merged)?;
    println!("Merged catalogs written to {}", path.display());
    Ok(MergeOutput::Written(path))
}
