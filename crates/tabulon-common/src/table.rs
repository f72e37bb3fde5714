//! Abstract row/column table consumed by the compiler.
//!
//! A [`Table`] is a rectangle of strings with stable dimensions for the
//! duration of a parse. Physical file formats (CSV, workbooks) are adapted
//! into this shape by backends; the compiler never sees anything else.

use crate::address::CellPos;
use crate::error::TableError;

/// Read-only view over a rectangular grid of cell strings (0-based).
pub trait Table: Send + Sync {
    /// Sheet name used in diagnostics.
    fn name(&self) -> &str;

    fn row_count(&self) -> usize;

    fn col_count(&self) -> usize;

    /// Raw text of one cell. Positions inside the dimensions but past the end
    /// of a ragged row read as blank.
    fn cell(&self, row: usize, col: usize) -> Result<&str, TableError>;

    fn out_of_range(&self, row: usize, col: usize) -> TableError {
        TableError::OutOfRange {
            pos: CellPos::new(row, col),
            rows: self.row_count(),
            cols: self.col_count(),
        }
    }
}

impl<T: Table + ?Sized> Table for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn col_count(&self) -> usize {
        (**self).col_count()
    }

    fn cell(&self, row: usize, col: usize) -> Result<&str, TableError> {
        (**self).cell(row, col)
    }
}

impl<T: Table + ?Sized> Table for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn col_count(&self) -> usize {
        (**self).col_count()
    }

    fn cell(&self, row: usize, col: usize) -> Result<&str, TableError> {
        (**self).cell(row, col)
    }
}

/// Owned in-memory table. Rows may be ragged; the column count is the widest
/// row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemTable {
    name: String,
    rows: Vec<Vec<String>>,
    cols: usize,
}

impl MemTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            cols: 0,
        }
    }

    /// Build a table from any nested iterator of string-like cells.
    pub fn from_rows<R, C, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(name);
        for row in rows {
            table.push_row(row.into_iter().map(Into::into).collect());
        }
        table
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.cols = self.cols.max(row.len());
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl Table for MemTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn col_count(&self) -> usize {
        self.cols
    }

    fn cell(&self, row: usize, col: usize) -> Result<&str, TableError> {
        if row >= self.rows.len() || col >= self.cols {
            return Err(self.out_of_range(row, col));
        }
        Ok(self.rows[row].get(col).map(String::as_str).unwrap_or(""))
    }
}

/// View that swaps rows and columns of the wrapped table, so that sheets laid
/// out with one record per column can be read with the row-oriented engine.
#[derive(Debug, Clone)]
pub struct Transposed<T> {
    inner: T,
}

impl<T: Table> Transposed<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Table> Table for Transposed<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn row_count(&self) -> usize {
        self.inner.col_count()
    }

    fn col_count(&self) -> usize {
        self.inner.row_count()
    }

    fn cell(&self, row: usize, col: usize) -> Result<&str, TableError> {
        self.inner.cell(col, row).map_err(|_| self.out_of_range(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemTable {
        MemTable::from_rows("Item", [vec!["ID", "Name", "Num"], vec!["1", "Apple"]])
    }

    #[test]
    fn ragged_rows_read_blank() {
        let table = sample();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.col_count(), 3);
        assert_eq!(table.cell(1, 1).unwrap(), "Apple");
        assert_eq!(table.cell(1, 2).unwrap(), "");
    }

    #[test]
    fn out_of_range_reports_position() {
        let table = sample();
        let err = table.cell(2, 0).unwrap_err();
        assert_eq!(
            err,
            TableError::OutOfRange {
                pos: CellPos::new(2, 0),
                rows: 2,
                cols: 3
            }
        );
        assert_eq!(
            err.to_string(),
            "cell A3 is out of range (table has 2 rows x 3 columns)"
        );
    }

    #[test]
    fn transposed_swaps_axes() {
        let table = Transposed::new(sample());
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.col_count(), 2);
        assert_eq!(table.cell(0, 1).unwrap(), "1");
        assert_eq!(table.cell(2, 0).unwrap(), "Num");
        assert!(table.cell(0, 2).is_err());
    }
}
