//! Errors reported by table providers.

use std::{error::Error, fmt};

use crate::address::CellPos;

/// Failure to read a cell from a [`Table`](crate::Table).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableError {
    /// The requested position lies outside the table's reported dimensions.
    OutOfRange {
        pos: CellPos,
        rows: usize,
        cols: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::OutOfRange { pos, rows, cols } => write!(
                f,
                "cell {pos} is out of range (table has {rows} rows x {cols} columns)"
            ),
        }
    }
}

impl Error for TableError {}
