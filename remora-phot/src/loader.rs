//! Reader for raw DOLPHOT photometry: one star per line, whitespace
//! separated, optionally gzipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::columns::ColumnTable;
use crate::error::{PhotError, Result};
use crate::select::Selection;
use crate::table::{Column, PhotTable};

/// DOLPHOT writes this in place of magnitudes it could not measure.
pub const MISSING_SENTINEL: f64 = 99.999;

/// Loads the selected columns of a raw photometry file.
///
/// Every non-blank line must carry one field per entry of `columns`. A
/// path whose name ends in `gz` is decompressed on the fly, across every
/// gzip member in the file.
pub fn load_table(path: impl AsRef<Path>, columns: &ColumnTable, selection: &Selection) -> Result<PhotTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PhotError::io(path, e))?;

    let table = if is_gzipped(path) {
        let reader = BufReader::new(MultiGzDecoder::new(file));
        read_rows(reader, path, columns.len(), selection, true)?
    } else {
        read_rows(BufReader::new(file), path, columns.len(), selection, false)?
    };

    debug!(
        "Loaded {} rows x {} columns from {:?}",
        table.nrows(),
        table.ncols(),
        path
    );
    Ok(table)
}

fn is_gzipped(path: &Path) -> bool {
    path.to_string_lossy().ends_with("gz")
}

fn read_rows<R: BufRead>(
    reader: R,
    path: &Path,
    ncols: usize,
    selection: &Selection,
    compressed: bool,
) -> Result<PhotTable> {
    if let Some((name, offset)) = selection.iter().find(|&(_, offset)| offset >= ncols) {
        return Err(PhotError::format(format!(
            "{}: column '{}' at offset {} is beyond the {} described columns",
            path.display(),
            name,
            offset,
            ncols
        )));
    }

    let mut values: Vec<Column> = vec![Vec::new(); selection.len()];

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            if compressed {
                PhotError::compression(path, e)
            } else {
                PhotError::io(path, e)
            }
        })?;
        let line_num = i + 1;

        let fields: Vec<&str> = line.split_ascii_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != ncols {
            return Err(PhotError::format(format!(
                "{} line {}: expected {} fields, found {}",
                path.display(),
                line_num,
                ncols,
                fields.len()
            )));
        }

        for (column, (_, offset)) in values.iter_mut().zip(selection.iter()) {
            column.push(parse_value(fields[offset], path, line_num)?);
        }
    }

    let named = selection
        .names()
        .into_iter()
        .map(str::to_string)
        .zip(values)
        .collect();
    PhotTable::from_columns(named)
}

fn parse_value(token: &str, path: &Path, line_num: usize) -> Result<Option<f64>> {
    let value: f64 = token.parse().map_err(|_| {
        PhotError::format(format!(
            "{} line {}: '{}' is not a number",
            path.display(),
            line_num,
            token
        ))
    })?;
    Ok(if value == MISSING_SENTINEL { None } else { Some(value) })
}
