use crate::error::{PhotError, Result};

pub type Column = Vec<Option<f64>>;

/// Named columns of equal length. `None` marks a missing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotTable {
    names: Vec<String>,
    columns: Vec<Column>,
    nrows: usize,
}

impl PhotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        let mut table = Self::new();
        for (name, values) in columns {
            table.add_column(name, values)?;
        }
        Ok(table)
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.position(name).map(|i| self.columns[i].as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn require_column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)
            .ok_or_else(|| PhotError::format(format!("table has no '{}' column", name)))
    }

    /// Appends a column. The first column of an empty table fixes the row
    /// count.
    pub fn add_column(&mut self, name: impl Into<String>, values: Column) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(PhotError::format(format!("duplicate column '{}'", name)));
        }
        if self.names.is_empty() {
            self.nrows = values.len();
        } else if values.len() != self.nrows {
            return Err(PhotError::format(format!(
                "column '{}' has {} rows, table has {}",
                name,
                values.len(),
                self.nrows
            )));
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Removes a column. Dropping the last one leaves an empty table with
    /// no rows.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let values = self.take_column(name)?;
        if self.names.is_empty() {
            self.nrows = 0;
        }
        Some(values)
    }

    fn take_column(&mut self, name: &str) -> Option<Column> {
        let i = self.position(name)?;
        self.names.remove(i);
        Some(self.columns.remove(i))
    }

    /// Moves `leading` to the front, keeping the order of the rest.
    pub fn reorder(&mut self, leading: &[&str]) -> Result<()> {
        let mut names = Vec::with_capacity(self.names.len());
        let mut columns = Vec::with_capacity(self.columns.len());

        for name in leading {
            let values = self
                .take_column(name)
                .ok_or_else(|| PhotError::format(format!("table has no '{}' column", name)))?;
            names.push(name.to_string());
            columns.push(values);
        }
        names.append(&mut self.names);
        columns.append(&mut self.columns);

        self.names = names;
        self.columns = columns;
        Ok(())
    }

    /// Rows for which `keep(row)` is true, in order.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Self {
        let rows: Vec<usize> = (0..self.nrows).filter(|&row| keep(row)).collect();
        Self {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|values| rows.iter().map(|&row| values[row]).collect())
                .collect(),
            nrows: rows.len(),
        }
    }

    /// Stacks tables with identical column names row-wise.
    pub fn concat(tables: &[PhotTable]) -> Result<Self> {
        let Some(first) = tables.first() else {
            return Ok(Self::new());
        };

        let mut out = Self {
            names: first.names.clone(),
            columns: vec![Vec::new(); first.ncols()],
            nrows: 0,
        };
        for (i, table) in tables.iter().enumerate() {
            if table.names != first.names {
                return Err(PhotError::format(format!(
                    "table {} columns {:?} differ from {:?}",
                    i + 1,
                    table.names,
                    first.names
                )));
            }
            for (dst, src) in out.columns.iter_mut().zip(&table.columns) {
                dst.extend_from_slice(src);
            }
            out.nrows += table.nrows;
        }
        Ok(out)
    }

    pub fn min(&self, name: &str) -> Option<f64> {
        self.column(name)?.iter().flatten().copied().reduce(f64::min)
    }

    pub fn max(&self, name: &str) -> Option<f64> {
        self.column(name)?.iter().flatten().copied().reduce(f64::max)
    }
}
