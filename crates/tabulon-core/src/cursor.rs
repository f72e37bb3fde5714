//! One data row addressed by column name.
//!
//! Besides exact lookups a row supports prefix counting for horizontally
//! repeated groups (`Item1ID`, `Item2ID`, ...) and fills blank map keys from
//! the previous row when the surrounding group is unchanged, so authors can
//! leave repeated keys empty.

use once_cell::sync::Lazy;
use regex::Regex;
use tabulon_common::{CellPos, Table, column_letters};

use crate::columns::{ColumnIndex, physical};
use crate::error::{CellContext, ErrorKind, ParseError, ResultExt};

static KEYED_LIST_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[^\]]*\]<[^>]+>").expect("keyed list regex must compile"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell<'a> {
    /// Column index, `None` for the synthetic cell of a missing optional column.
    pub col: Option<usize>,
    pub data: String,
    pub ty: &'a str,
    /// `data` was copied from the previous row.
    pub auto_populated: bool,
}

impl Cell<'_> {
    pub fn is_blank(&self) -> bool {
        self.data.trim().is_empty()
    }

    /// Carries data written in this row (auto-populated keys do not count).
    pub fn is_present(&self) -> bool {
        !self.is_blank() && !self.auto_populated
    }
}

static MISSING: Cell<'static> = Cell {
    col: None,
    data: String::new(),
    ty: "",
    auto_populated: false,
};

#[derive(Debug, Clone)]
pub struct RowCells<'a> {
    sheet: &'a str,
    row: usize,
    transposed: bool,
    index: &'a ColumnIndex,
    cells: Vec<Cell<'a>>,
}

impl<'a> RowCells<'a> {
    /// Read row `row` (0-based) of `table`. `prev` is the previously built
    /// row and only feeds key auto-population.
    pub fn build(
        sheet: &'a str,
        row: usize,
        index: &'a ColumnIndex,
        table: &dyn Table,
        prev: Option<&RowCells<'_>>,
        transposed: bool,
    ) -> Result<Self, ParseError> {
        let mut cells: Vec<Cell<'a>> = Vec::with_capacity(index.len());
        for column in index.columns() {
            let data = table.cell(row, column.index).at(|| CellContext {
                sheet: sheet.to_string(),
                position: Some(physical(CellPos::new(row, column.index), transposed).to_string()),
                column: Some(column.name.clone()),
                data: None,
            })?;
            let mut cell = Cell {
                col: Some(column.index),
                data: data.to_string(),
                ty: column.ty.as_str(),
                auto_populated: false,
            };
            if let Some(prev) = prev {
                if cell.is_blank() && is_keyed_type(cell.ty) && !column.name.is_empty() {
                    populate_key(&mut cell, &column.name, index, &cells, prev);
                }
            }
            cells.push(cell);
        }
        Ok(Self {
            sheet,
            row,
            transposed,
            index,
            cells,
        })
    }

    pub fn sheet(&self) -> &str {
        self.sheet
    }

    /// 0-based row in the table this row was read from.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn get(&self, name: &str) -> Option<&Cell<'a>> {
        self.index.index_of(name).map(|i| &self.cells[i])
    }

    /// Cell named `name`. Missing columns read as a synthetic blank cell when
    /// `optional`, otherwise fail with `ColumnNotFound`.
    pub fn cell(&self, name: &str, optional: bool) -> Result<&Cell<'a>, ParseError> {
        match self.get(name) {
            Some(cell) => Ok(cell),
            None if optional => Ok(&MISSING),
            None => Err(ParseError::new(ErrorKind::ColumnNotFound {
                name: name.to_string(),
            })
            .with_context(self.context(name))),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.index_of(name).is_some()
    }

    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.index.count_with_prefix(prefix)
    }

    /// `B5` for a known column. For an unknown one, the span of its sibling
    /// columns (`B5:D5`) or just the row.
    pub fn position(&self, name: &str) -> String {
        if let Some(col) = self.index.index_of(name) {
            return physical(CellPos::new(self.row, col), self.transposed).to_string();
        }
        if let Some(span) = self.index.span_with_prefix(strip_last_segment(name)) {
            let start = physical(CellPos::new(self.row, span.start), self.transposed);
            let end = physical(CellPos::new(self.row, span.end), self.transposed);
            return if start == end {
                start.to_string()
            } else {
                format!("{start}:{end}")
            };
        }
        if self.transposed {
            format!("column {}", column_letters(self.row))
        } else {
            format!("row {}", self.row + 1)
        }
    }

    pub fn context(&self, name: &str) -> CellContext {
        CellContext {
            sheet: self.sheet.to_string(),
            position: Some(self.position(name)),
            column: Some(name.to_string()),
            data: self.get(name).map(|c| c.data.clone()),
        }
    }

    /// Context for a column group such as `Item2` (all `Item2*` columns).
    pub fn group_context(&self, prefix: &str) -> CellContext {
        let position = match self.index.span_with_prefix(prefix) {
            Some(span) => {
                let start = physical(CellPos::new(self.row, span.start), self.transposed);
                let end = physical(CellPos::new(self.row, span.end), self.transposed);
                if start == end {
                    start.to_string()
                } else {
                    format!("{start}:{end}")
                }
            }
            None => self.position(prefix),
        };
        CellContext {
            sheet: self.sheet.to_string(),
            position: Some(position),
            column: Some(prefix.to_string()),
            data: None,
        }
    }

    /// Every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }
}

/// Copy the previous row's key when every earlier cell of the same group
/// (same name prefix) is unchanged.
fn populate_key(
    cell: &mut Cell<'_>,
    name: &str,
    index: &ColumnIndex,
    earlier: &[Cell<'_>],
    prev: &RowCells<'_>,
) {
    let prefix = key_prefix(name);
    let unchanged = index
        .columns()
        .iter()
        .zip(earlier)
        .filter(|(column, _)| !column.name.is_empty() && column.name.starts_with(prefix))
        .all(|(column, current)| {
            prev.get(&column.name)
                .is_some_and(|before| before.data == current.data)
        });
    if !unchanged {
        return;
    }
    let Some(before) = prev.get(name) else {
        return;
    };
    if before.is_blank() {
        return;
    }
    #[cfg(feature = "tracing")]
    tracing::trace!(column = name, data = %before.data, row = prev.row + 1, "auto-populated key");
    cell.data = before.data.clone();
    cell.auto_populated = true;
}

/// Map columns (`map<...>`) and keyed list columns (`[Elem]<Key>`).
pub fn is_keyed_type(ty: &str) -> bool {
    ty.starts_with("map<") || KEYED_LIST_TYPE.is_match(ty)
}

/// Byte offsets where camel-case segments begin. Digits stay with the
/// preceding segment and an acronym ends before its last capital when a
/// lowercase letter follows (`HTTPServer` is `HTTP` + `Server`).
fn segment_starts(name: &str) -> Vec<usize> {
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    let mut starts = Vec::new();
    let mut in_segment = false;
    for (i, &(pos, c)) in chars.iter().enumerate() {
        if c == '_' {
            in_segment = false;
            continue;
        }
        let prev = i.checked_sub(1).map(|j| chars[j].1);
        let next = chars.get(i + 1).map(|&(_, n)| n);
        let boundary = !in_segment
            || (c.is_uppercase()
                && match prev {
                    Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                    Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                    _ => false,
                });
        if boundary {
            starts.push(pos);
        }
        in_segment = true;
    }
    starts
}

/// Name without its last two camel-case segments: `ShopGoodsID` -> `Shop`.
pub fn key_prefix(name: &str) -> &str {
    let starts = segment_starts(name);
    if starts.len() < 2 {
        return "";
    }
    name[..starts[starts.len() - 2]].trim_end_matches('_')
}

fn strip_last_segment(name: &str) -> &str {
    match segment_starts(name).last() {
        Some(&start) => name[..start].trim_end_matches('_'),
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use tabulon_common::MemTable;
    use tabulon_spec::HeaderLayout;

    use super::*;

    #[test]
    fn camel_prefixes() {
        assert_eq!(key_prefix("ShopGoodsID"), "Shop");
        assert_eq!(key_prefix("ShopID"), "");
        assert_eq!(key_prefix("Item1ID"), "");
        assert_eq!(key_prefix("RewardItem1ID"), "Reward");
        assert_eq!(key_prefix("HTTPServerPortID"), "HTTPServer");
        assert_eq!(key_prefix("shop_goods_id"), "shop");
        assert_eq!(strip_last_segment("Item3ID"), "Item3");
    }

    #[test]
    fn keyed_types() {
        assert!(is_keyed_type("map<uint32, Item>"));
        assert!(is_keyed_type("[Item]<uint32>"));
        assert!(!is_keyed_type("[Item]"));
        assert!(!is_keyed_type("uint32"));
    }

    fn table() -> MemTable {
        MemTable::from_rows(
            "Shop",
            [
                vec!["ShopID", "ShopGoodsID", "ShopGoodsPrice"],
                vec!["map<uint32, Shop>", "map<uint32, Goods>", "int32"],
                vec!["1", "10", "100"],
                vec!["", "11", "110"],
                vec!["2", "", "120"],
            ],
        )
    }

    fn rows<'a>(table: &MemTable, index: &'a ColumnIndex) -> Vec<RowCells<'a>> {
        let mut out: Vec<RowCells<'a>> = Vec::new();
        for row in 2..table.row_count() {
            let built = RowCells::build("Shop", row, index, table, out.last(), false).unwrap();
            out.push(built);
        }
        out
    }

    #[test]
    fn auto_populates_key_when_group_is_unchanged() {
        let table = table();
        let index =
            ColumnIndex::resolve(&table, &HeaderLayout::names_and_types(1, 2), false).unwrap();
        let rows = rows(&table, &index);

        let shop = rows[1].cell("ShopID", false).unwrap();
        assert_eq!(shop.data, "1");
        assert!(shop.auto_populated);
        assert!(!shop.is_present());

        // ShopID changed, so the goods key is not inherited.
        let goods = rows[2].cell("ShopGoodsID", false).unwrap();
        assert_eq!(goods.data, "");
        assert!(!goods.auto_populated);
    }

    #[test]
    fn missing_columns() {
        let table = table();
        let index =
            ColumnIndex::resolve(&table, &HeaderLayout::names_and_types(1, 2), false).unwrap();
        let rows = rows(&table, &index);

        let synthetic = rows[0].cell("ShopName", true).unwrap();
        assert_eq!(synthetic.col, None);
        assert!(synthetic.is_blank());

        let err = rows[0].cell("ShopGoodsNum", false).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::ColumnNotFound {
                name: "ShopGoodsNum".into()
            }
        );
        let context = err.context().unwrap();
        assert_eq!(context.sheet, "Shop");
        assert_eq!(context.position.as_deref(), Some("B3:C3"));
        assert_eq!(rows[0].position("Nothing"), "row 3");
        assert_eq!(rows[0].position("ShopGoodsPrice"), "C3");
    }
}
