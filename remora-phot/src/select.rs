use once_cell::sync::Lazy;
use regex::Regex;

use crate::columns::ColumnTable;
use crate::error::{PhotError, Result};

/// `X`, `Y` and every column that starts with an ACS/WFC3 filter name.
pub const DEFAULT_SELECTION: &str = r"^[XY]$|^[FG]Q?[0-9]{2,5}[WMNXL]P?_";

static DEFAULT_SELECTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&anchored(DEFAULT_SELECTION)).unwrap());

/// Column names paired with their 0-based position in a raw row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    columns: Vec<(String, usize)>,
}

impl Selection {
    /// Every column of the table, in order.
    pub fn all(table: &ColumnTable) -> Self {
        Self {
            columns: table
                .iter()
                .map(|c| (c.name.clone(), c.offset()))
                .collect(),
        }
    }

    pub fn from_pairs(columns: Vec<(String, usize)>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.columns.iter().map(|(name, offset)| (name.as_str(), *offset))
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn offsets(&self) -> Vec<usize> {
        self.columns.iter().map(|(_, offset)| *offset).collect()
    }
}

fn anchored(pattern: &str) -> String {
    format!("^(?:{})", pattern)
}

/// Columns whose name matches `pattern` at its start, in column order.
pub fn select_columns(table: &ColumnTable, pattern: &str) -> Result<Selection> {
    if pattern == DEFAULT_SELECTION {
        return Ok(select_with(table, &DEFAULT_SELECTION_REGEX));
    }
    let re = Regex::new(&anchored(pattern))
        .map_err(|e| PhotError::config(format!("invalid selection pattern '{}': {}", pattern, e)))?;
    Ok(select_with(table, &re))
}

fn select_with(table: &ColumnTable, re: &Regex) -> Selection {
    Selection {
        columns: table
            .iter()
            .filter(|c| re.is_match(&c.name))
            .map(|c| (c.name.clone(), c.offset()))
            .collect(),
    }
}
