//! Photometry tables as FITS binary tables.
//!
//! A file holds an empty primary HDU followed by one `BINTABLE` extension
//! named `PHOTOMETRY`. Every table column is stored as a big-endian double
//! (`TFORM = '1D'`), with NaN standing in for missing values.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use memmap2::Mmap;
use remora_wcs::{KeywordProvider, TextHeader};
use tracing::debug;

use crate::error::{PhotError, Result};
use crate::layout::temp_path;
use crate::table::PhotTable;

const FITS_BLOCK_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;
const MAX_STRING_VALUE: usize = 68;
const KEYWORD_SIZE: usize = 8;
const MAX_FIELDS: usize = 999;
const VALUE_SIZE: usize = 8;
const EXTNAME: &str = "PHOTOMETRY";
const COLUMN_FORMAT: &str = "1D";

enum CardValue<'a> {
    Logical(bool),
    Integer(i64),
    Str(&'a str),
}

/// Writes `table` to `path` through a temporary file that is renamed into
/// place once complete.
pub fn write_table(path: impl AsRef<Path>, table: &PhotTable) -> Result<()> {
    let path = path.as_ref();
    let temp = temp_path(path);

    if let Err(e) = write_file(&temp, table) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    fs::rename(&temp, path).map_err(|e| PhotError::io(path, e))?;

    debug!(
        "Wrote {} rows x {} columns to {:?}",
        table.nrows(),
        table.ncols(),
        path
    );
    Ok(())
}

fn write_file(path: &Path, table: &PhotTable) -> Result<()> {
    let io_err = |e| PhotError::io(path, e);
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    let primary = build_header(&[
        ("SIMPLE", CardValue::Logical(true)),
        ("BITPIX", CardValue::Integer(8)),
        ("NAXIS", CardValue::Integer(0)),
        ("EXTEND", CardValue::Logical(true)),
    ])?;
    writer.write_all(&primary).map_err(io_err)?;

    let names = table.names();
    if names.len() > MAX_FIELDS {
        return Err(PhotError::format(format!(
            "{}: {} columns exceed the FITS limit of {} table fields",
            path.display(),
            names.len(),
            MAX_FIELDS
        )));
    }
    let ttypes: Vec<(String, String)> = (1..=names.len())
        .map(|i| (format!("TTYPE{}", i), format!("TFORM{}", i)))
        .collect();

    let mut cards = vec![
        ("XTENSION", CardValue::Str("BINTABLE")),
        ("BITPIX", CardValue::Integer(8)),
        ("NAXIS", CardValue::Integer(2)),
        ("NAXIS1", CardValue::Integer((VALUE_SIZE * names.len()) as i64)),
        ("NAXIS2", CardValue::Integer(table.nrows() as i64)),
        ("PCOUNT", CardValue::Integer(0)),
        ("GCOUNT", CardValue::Integer(1)),
        ("TFIELDS", CardValue::Integer(names.len() as i64)),
    ];
    for (name, (ttype, tform)) in names.iter().zip(&ttypes) {
        cards.push((ttype.as_str(), CardValue::Str(name)));
        cards.push((tform.as_str(), CardValue::Str(COLUMN_FORMAT)));
    }
    cards.push(("EXTNAME", CardValue::Str(EXTNAME)));
    writer.write_all(&build_header(&cards)?).map_err(io_err)?;

    let columns: Vec<&[Option<f64>]> = table.columns().map(|(_, values)| values).collect();
    for row in 0..table.nrows() {
        for values in &columns {
            writer
                .write_f64::<BigEndian>(values[row].unwrap_or(f64::NAN))
                .map_err(io_err)?;
        }
    }
    let data_len = table.nrows() * names.len() * VALUE_SIZE;
    writer
        .write_all(&vec![0u8; padding(data_len)])
        .map_err(io_err)?;

    writer.flush().map_err(io_err)?;
    Ok(())
}

fn build_header(cards: &[(&str, CardValue)]) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(FITS_BLOCK_SIZE);
    for (name, value) in cards {
        bytes.extend_from_slice(&format_card(name, value)?);
    }
    let mut end = [b' '; CARD_SIZE];
    end[0..3].copy_from_slice(b"END");
    bytes.extend_from_slice(&end);

    bytes.resize(bytes.len() + padding(bytes.len()), b' ');
    Ok(bytes)
}

fn format_card(name: &str, value: &CardValue) -> Result<[u8; CARD_SIZE]> {
    if name.len() > KEYWORD_SIZE || !name.is_ascii() {
        return Err(PhotError::format(format!("invalid FITS keyword '{}'", name)));
    }
    let mut card = [b' '; CARD_SIZE];
    card[0..name.len()].copy_from_slice(name.as_bytes());
    card[KEYWORD_SIZE] = b'=';
    card[KEYWORD_SIZE + 1] = b' ';

    let value_str = match value {
        CardValue::Logical(b) => format!("{:>20}", if *b { "T" } else { "F" }),
        CardValue::Integer(i) => format!("{:>20}", i),
        CardValue::Str(s) => {
            let escaped = s.replace('\'', "''");
            if !s.is_ascii() || escaped.len() > MAX_STRING_VALUE - 2 {
                return Err(PhotError::format(format!(
                    "cannot store '{}' in FITS keyword {}",
                    s, name
                )));
            }
            format!("'{:<8}'", escaped)
        }
    };

    let value_bytes = value_str.as_bytes();
    card[10..10 + value_bytes.len()].copy_from_slice(value_bytes);
    Ok(card)
}

fn padding(len: usize) -> usize {
    (FITS_BLOCK_SIZE - len % FITS_BLOCK_SIZE) % FITS_BLOCK_SIZE
}

/// Reads a table written by [`write_table`] through a read-only memory map.
pub fn read_table(path: impl AsRef<Path>) -> Result<PhotTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PhotError::io(path, e))?;
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| PhotError::io(path, e))?;

    let (primary, primary_len) = read_header(&mmap, 0, path)?;
    let ext_start = primary_len + padded(primary_data_len(&primary));

    let (header, header_len) = read_header(&mmap, ext_start, path)?;
    let bad = |message: String| PhotError::format(format!("{}: {}", path.display(), message));

    if header.get_string("XTENSION").as_deref() != Some("BINTABLE") {
        return Err(bad("first extension is not a binary table".to_string()));
    }
    let row_len = require_count(&header, "NAXIS1", path)?;
    let nrows = require_count(&header, "NAXIS2", path)?;
    let ncols = require_count(&header, "TFIELDS", path)?;
    if row_len != ncols * VALUE_SIZE {
        return Err(bad(format!(
            "row length {} does not match {} double columns",
            row_len, ncols
        )));
    }

    let mut names = Vec::with_capacity(ncols);
    for i in 1..=ncols {
        let tform = header.get_string(&format!("TFORM{}", i)).unwrap_or_default();
        if !matches!(tform.trim(), "1D" | "D") {
            return Err(bad(format!("column {} has unsupported format '{}'", i, tform)));
        }
        let name = header
            .get_string(&format!("TTYPE{}", i))
            .ok_or_else(|| bad(format!("column {} has no TTYPE", i)))?;
        names.push(name);
    }

    let data_start = ext_start + header_len;
    let data_end = data_start + row_len * nrows;
    if mmap.len() < data_end {
        return Err(bad(format!(
            "truncated data: need {} bytes, file has {}",
            data_end,
            mmap.len()
        )));
    }
    let data = &mmap[data_start..data_end];

    let columns: Vec<(String, Vec<Option<f64>>)> = names
        .into_iter()
        .enumerate()
        .map(|(col, name)| {
            let values: Vec<Option<f64>> = (0..nrows)
                .map(|row| {
                    let pos = row * row_len + col * VALUE_SIZE;
                    let value = BigEndian::read_f64(&data[pos..pos + VALUE_SIZE]);
                    (!value.is_nan()).then_some(value)
                })
                .collect();
            (name, values)
        })
        .collect();
    let table = PhotTable::from_columns(columns)?;

    debug!("Read {} rows from {:?}", table.nrows(), path);
    Ok(table)
}

/// Parses the header starting at `offset`; returns it with its padded size.
fn read_header(bytes: &[u8], offset: usize, path: &Path) -> Result<(TextHeader, usize)> {
    let mut lines = Vec::new();
    let mut pos = offset;

    loop {
        let card = bytes.get(pos..pos + CARD_SIZE).ok_or_else(|| {
            PhotError::format(format!("{}: header has no END card", path.display()))
        })?;
        let line = std::str::from_utf8(card).map_err(|_| {
            PhotError::format(format!("{}: non-ASCII header card", path.display()))
        })?;
        lines.push(line);
        pos += CARD_SIZE;
        if line.trim_end() == "END" {
            break;
        }
    }

    let header = TextHeader::parse(&lines.join("\n"))
        .map_err(|e| PhotError::format(format!("{}: {}", path.display(), e)))?;
    Ok((header, padded(pos - offset)))
}

fn primary_data_len(header: &TextHeader) -> usize {
    let naxis = header.get_int("NAXIS").unwrap_or(0);
    if naxis <= 0 {
        return 0;
    }
    let bytes_per_value = header.get_int("BITPIX").unwrap_or(8).unsigned_abs() as usize / 8;
    (1..=naxis)
        .map(|i| header.get_int(&format!("NAXIS{}", i)).unwrap_or(0).max(0) as usize)
        .product::<usize>()
        * bytes_per_value
}

fn padded(len: usize) -> usize {
    len + padding(len)
}

fn require_count(header: &TextHeader, key: &str, path: &Path) -> Result<usize> {
    header
        .get_int(key)
        .filter(|&n| n >= 0)
        .map(|n| n as usize)
        .ok_or_else(|| {
            PhotError::format(format!("{}: missing or invalid {}", path.display(), key))
        })
}
