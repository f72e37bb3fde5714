//! Header rows to column lookup.

use rustc_hash::FxHashMap;
use tabulon_common::{CellPos, ColumnSpan, Table, column_letters};
use tabulon_spec::HeaderLayout;

use crate::error::{CellContext, ErrorKind, ParseError, ResultExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// 0-based column index in the (possibly transposed) table.
    pub index: usize,
    pub name: String,
    /// Declared type from the type row, empty when the sheet has none.
    pub ty: String,
}

/// Columns of one sheet and a name lookup over the non-blank ones.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    columns: Vec<Column>,
    lookup: FxHashMap<String, usize>,
}

impl ColumnIndex {
    /// Read the name row (and type row, if any) of `table`. Rows in `header`
    /// are 1-based. A table shorter than the name row has no columns.
    /// `transposed` only affects the positions reported in errors.
    pub fn resolve(
        table: &dyn Table,
        header: &HeaderLayout,
        transposed: bool,
    ) -> Result<Self, ParseError> {
        let mut index = Self::default();
        let name_row = header.namerow.saturating_sub(1) as usize;
        if name_row >= table.row_count() {
            return Ok(index);
        }
        let type_row = header
            .typerow
            .map(|r| r.saturating_sub(1) as usize)
            .filter(|r| *r < table.row_count());

        for col in 0..table.col_count() {
            let context = || CellContext {
                sheet: table.name().to_string(),
                position: Some(physical(CellPos::new(name_row, col), transposed).to_string()),
                ..CellContext::default()
            };
            let name = select_line(table.cell(name_row, col).at(context)?, header.nameline);
            let ty = match type_row {
                Some(row) => select_line(table.cell(row, col).at(context)?, header.typeline),
                None => String::new(),
            };
            if !name.is_empty() {
                if let Some(&first) = index.lookup.get(&name) {
                    return Err(ParseError::new(ErrorKind::DuplicateColumn {
                        name: name.clone(),
                        first: column_letters(first),
                        second: column_letters(col),
                    })
                    .with_context(CellContext {
                        column: Some(name),
                        ..context()
                    }));
                }
                index.lookup.insert(name.clone(), col);
            }
            index.columns.push(Column {
                index: col,
                name,
                ty,
            });
        }
        Ok(index)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.index_of(name).map(|i| &self.columns[i])
    }

    /// Largest `N` such that some column is named `{prefix}{N}...`.
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.columns
            .iter()
            .filter_map(|c| {
                let rest = c.name.strip_prefix(prefix)?;
                let digits = rest.len()
                    - rest
                        .trim_start_matches(|ch: char| ch.is_ascii_digit())
                        .len();
                rest[..digits].parse::<usize>().ok()
            })
            .max()
            .unwrap_or(0)
    }

    /// Span from the first to the last column whose name starts with `prefix`.
    pub fn span_with_prefix(&self, prefix: &str) -> Option<ColumnSpan> {
        if prefix.is_empty() {
            return None;
        }
        let mut matching = self
            .columns
            .iter()
            .filter(|c| c.name.starts_with(prefix))
            .map(|c| c.index);
        let first = matching.next()?;
        let last = matching.last().unwrap_or(first);
        Some(ColumnSpan::new(first, last))
    }
}

/// Position in the sheet as stored, undoing a transposed view.
pub(crate) fn physical(pos: CellPos, transposed: bool) -> CellPos {
    if transposed { pos.transposed() } else { pos }
}

/// Line `0` is the whole trimmed cell, otherwise the Nth physical line.
fn select_line(text: &str, line: u32) -> String {
    if line == 0 {
        return text.trim().to_string();
    }
    text.lines()
        .nth(line as usize - 1)
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}
