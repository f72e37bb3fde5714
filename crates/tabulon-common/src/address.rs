//! Spreadsheet-style cell addressing used for diagnostics.
//!
//! Positions are stored 0-based internally and rendered the way a human reads
//! a sheet: column letters followed by a 1-based row (`B3`).

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Render a 0-based column index as spreadsheet letters (`0 -> A`, `27 -> AB`).
pub fn column_letters(mut col: usize) -> String {
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

/// Parse spreadsheet column letters into a 0-based index.
///
/// Returns `None` for empty input, lowercase letters or anything that is not
/// `A-Z`.
pub fn column_index(s: &str) -> Option<usize> {
    if s.is_empty() {
        return None;
    }
    let mut col: usize = 0;
    for (idx, ch) in s.bytes().enumerate() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let val = (ch - b'A') as usize;
        col = col.checked_mul(26)?;
        col = col.checked_add(val)?;
        if idx != s.len() - 1 {
            col = col.checked_add(1)?;
        }
    }
    Some(col)
}

/// Absolute 0-based cell position inside a table.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Swap the axes, used when reading transposed sheets.
    pub const fn transposed(self) -> Self {
        Self {
            row: self.col,
            col: self.row,
        }
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row + 1)
    }
}

/// One or more adjacent columns, rendered as `B` or `B:D`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnSpan {
    pub start: usize,
    pub end: usize,
}

impl ColumnSpan {
    pub const fn single(col: usize) -> Self {
        Self {
            start: col,
            end: col,
        }
    }

    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

impl fmt::Display for ColumnSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            f.write_str(&column_letters(self.start))
        } else {
            write!(
                f,
                "{}:{}",
                column_letters(self.start),
                column_letters(self.end)
            )
        }
    }
}
