use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tabulon_common::MemTable;

use crate::error::IoError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvTrim {
    #[default]
    None,
    All,
}

#[derive(Clone, Debug)]
pub struct CsvReadOptions {
    /// Field delimiter as a single byte. Use `b'\t'` for TSV.
    pub delimiter: u8,
    pub trim: CsvTrim,
    /// Drop a leading UTF-8 byte order mark, as written by spreadsheet exports.
    pub strip_bom: bool,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: CsvTrim::None,
            strip_bom: true,
        }
    }
}

/// CSV backend adapter.
///
/// Semantics:
/// - A CSV file is one sheet, named after the file stem unless renamed.
/// - UTF-8 only. Every record, header rows included, becomes a table row.
/// - Ragged rows are allowed; missing cells read as blank.
pub struct CsvAdapter {
    table: MemTable,
    read_options: CsvReadOptions,
}

impl CsvAdapter {
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        Self::open_path_with_options(path, CsvReadOptions::default())
    }

    pub fn open_path_with_options<P: AsRef<Path>>(
        path: P,
        read_options: CsvReadOptions,
    ) -> Result<Self, IoError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string());
        let file = File::open(path)?;
        Self::open_reader_with_options(name, BufReader::new(file), read_options)
    }

    pub fn open_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, IoError> {
        Self::open_bytes_with_options(name, bytes, CsvReadOptions::default())
    }

    pub fn open_bytes_with_options(
        name: impl Into<String>,
        bytes: Vec<u8>,
        read_options: CsvReadOptions,
    ) -> Result<Self, IoError> {
        Self::open_reader_with_options(name, std::io::Cursor::new(bytes), read_options)
    }

    pub fn open_reader_with_options<R: Read>(
        name: impl Into<String>,
        mut reader: R,
        read_options: CsvReadOptions,
    ) -> Result<Self, IoError> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        let body = if read_options.strip_bom {
            raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&raw)
        } else {
            &raw[..]
        };

        let mut rb = csv::ReaderBuilder::new();
        rb.delimiter(read_options.delimiter)
            .has_headers(false)
            // Allow ragged rows; missing cells read as blank.
            .flexible(true);
        match read_options.trim {
            CsvTrim::None => rb.trim(csv::Trim::None),
            CsvTrim::All => rb.trim(csv::Trim::All),
        };

        let mut table = MemTable::new(name);
        let mut rdr = rb.from_reader(body);
        for rec in rdr.records() {
            let rec = rec.map_err(|e| IoError::from_backend("csv", e))?;
            table.push_row(rec.iter().map(str::to_string).collect());
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(sheet = %tabulon_common::Table::name(&table), rows = table.rows().len(), "loaded csv");

        Ok(Self {
            table,
            read_options,
        })
    }

    pub fn read_options(&self) -> &CsvReadOptions {
        &self.read_options
    }

    pub fn table(&self) -> &MemTable {
        &self.table
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.table.rename(name);
    }

    pub fn into_table(self) -> MemTable {
        self.table
    }
}
