//! Named sheets loaded from disk or built in memory.

use std::collections::BTreeMap;
use std::sync::Arc;

use tabulon_common::{MemTable, Table, Transposed};
use tabulon_core::{ColumnIndex, ValueSpace, ValueSpaceSource};
use tabulon_spec::{HeaderLayout, Reference, Schema, SheetDescriptor};

use crate::error::IoError;

/// Sheets by name. Iteration follows name order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: BTreeMap<String, Arc<MemTable>>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet under its table name, replacing any previous one.
    pub fn insert(&mut self, table: MemTable) -> Option<Arc<MemTable>> {
        let name = table.name().to_string();
        self.sheets.insert(name, Arc::new(table))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<MemTable>> {
        self.sheets.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Arc<MemTable>, IoError> {
        self.get(name)
            .ok_or_else(|| IoError::SheetNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Load every `*.csv` file directly inside `dir`, one sheet per file,
    /// named by file stem.
    #[cfg(feature = "csv")]
    pub fn open_dir<P: AsRef<std::path::Path>>(dir: P) -> Result<Self, IoError> {
        Self::open_dir_with_options(dir, crate::backends::csv::CsvReadOptions::default())
    }

    #[cfg(feature = "csv")]
    pub fn open_dir_with_options<P: AsRef<std::path::Path>>(
        dir: P,
        options: crate::backends::csv::CsvReadOptions,
    ) -> Result<Self, IoError> {
        let dir = dir.as_ref();
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("open_dir", dir = %dir.display()).entered();

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if path.is_file() && is_csv {
                paths.push(path);
            }
        }
        paths.sort();

        let mut workbook = Self::new();
        for path in paths {
            let adapter =
                crate::backends::csv::CsvAdapter::open_path_with_options(&path, options.clone())?;
            workbook.insert(adapter.into_table());
        }
        Ok(workbook)
    }
}

impl FromIterator<MemTable> for Workbook {
    fn from_iter<I: IntoIterator<Item = MemTable>>(iter: I) -> Self {
        let mut workbook = Self::new();
        for table in iter {
            workbook.insert(table);
        }
        workbook
    }
}

/// Serves `refer` value spaces out of a workbook.
///
/// A reference `Sheet(Alias).Column` reads its header layout, transposition
/// and merger sheets from the descriptor of the sheet building `Alias`, or
/// of `Sheet` when no alias is given. Sheets without a descriptor use the
/// book's default header.
#[derive(Debug, Clone)]
pub struct WorkbookSpaces {
    workbook: Arc<Workbook>,
    schema: Arc<Schema>,
}

impl WorkbookSpaces {
    pub fn new(workbook: Arc<Workbook>, schema: Arc<Schema>) -> Self {
        Self { workbook, schema }
    }

    fn descriptor(&self, reference: &Reference) -> Option<&SheetDescriptor> {
        let found = match &reference.alias {
            Some(alias) => self.schema.sheet_for_message(alias),
            None => self.schema.sheet(&reference.sheet),
        };
        found.map(|d| d.as_ref())
    }

    fn collect(
        table: &dyn Table,
        header: &HeaderLayout,
        transposed: bool,
        column: &str,
        space: &mut ValueSpace,
    ) -> Result<(), String> {
        let index = ColumnIndex::resolve(table, header, transposed).map_err(|e| e.to_string())?;
        let Some(col) = index.index_of(column) else {
            return Err(format!("column `{column}` not found in sheet `{}`", table.name()));
        };
        let first = header.datarow.saturating_sub(1) as usize;
        for row in first..table.row_count() {
            let text = table.cell(row, col).map_err(|e| e.to_string())?.trim();
            if !text.is_empty() {
                space.insert(text.to_string());
            }
        }
        Ok(())
    }
}

impl ValueSpaceSource for WorkbookSpaces {
    fn load(&self, reference: &Reference) -> Result<ValueSpace, String> {
        let descriptor = self.descriptor(reference);
        let header = descriptor.map_or(self.schema.book.header, |d| d.header);
        let transpose = descriptor.is_some_and(|d| d.transpose);

        let mut names = vec![reference.sheet.as_str()];
        if let Some(d) = descriptor {
            names.extend(d.merger.iter().map(String::as_str));
        }

        let mut space = ValueSpace::default();
        for name in names {
            let table = self.workbook.require(name).map_err(|e| e.to_string())?;
            if transpose {
                Self::collect(&Transposed::new(table.as_ref()), &header, true, &reference.column, &mut space)?;
            } else {
                Self::collect(table.as_ref(), &header, false, &reference.column, &mut space)?;
            }
        }
        Ok(space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabulon_spec::Manifest;

    fn schema() -> Arc<Schema> {
        let yaml = r#"
spec: tabulon
spec_version: "0.2.0"
book: { name: Test }
messages:
  - name: ItemConf
    fields:
      - { name: item_map, type: "map<uint32, Item>", options: { name: Item, key: ID } }
  - name: Item
    fields:
      - { name: id, type: uint32, options: { name: ID } }
      - { name: name, type: string, options: { name: Name } }
sheets:
  - { message: ItemConf, sheet: Item, namerow: 1, typerow: 0, noterow: 0, merger: [Item2] }
"#;
        Arc::new(Manifest::from_yaml_str(yaml).unwrap().resolve().unwrap())
    }

    fn workbook() -> Arc<Workbook> {
        Arc::new(Workbook::from_iter([
            MemTable::from_rows("Item", [vec!["ItemID", "ItemName"], vec!["1", "Apple"], vec![" 2 ", "Pear"]]),
            MemTable::from_rows("Item2", [vec!["ItemID", "ItemName"], vec!["", "Blank"], vec!["3", "Plum"]]),
            MemTable::from_rows("Raw", [vec!["a"], vec!["b"], vec!["c"], vec!["Code"], vec!["X"]]),
        ]))
    }

    #[test]
    fn value_space_spans_merger_sheets() {
        let spaces = WorkbookSpaces::new(workbook(), schema());
        let space = spaces.load(&"Item(ItemConf).ItemID".parse().unwrap()).unwrap();
        let mut values: Vec<_> = space.into_iter().collect();
        values.sort();
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn unknown_sheets_use_the_book_header() {
        let spaces = WorkbookSpaces::new(workbook(), schema());
        // Default header: names on row 1, data from row 4.
        let err = spaces.load(&"Raw.Code".parse().unwrap()).unwrap_err();
        assert!(err.contains("Code"), "{err}");
        let space = spaces.load(&"Raw.a".parse().unwrap()).unwrap();
        assert!(space.contains("Code") && space.contains("X"));
        assert!(!space.contains("b"));
    }

    #[test]
    fn missing_sheet_is_reported() {
        let spaces = WorkbookSpaces::new(workbook(), schema());
        let err = spaces.load(&"Hero.ID".parse().unwrap()).unwrap_err();
        assert!(err.contains("Hero"), "{err}");
    }
}
