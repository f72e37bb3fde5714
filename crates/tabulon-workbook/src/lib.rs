//! Tabulon workbook I/O.
//!
//! Loads sheets into [`MemTable`](tabulon_common::MemTable)s, serves
//! cross-sheet value spaces to the engine, and encodes built documents as
//! JSON, protobuf text or protobuf wire bytes.

pub mod backends;
pub mod encode;
pub mod error;
pub mod workbook;

#[cfg(feature = "csv")]
pub use backends::csv::{CsvAdapter, CsvReadOptions, CsvTrim};
pub use encode::{EncodeOptions, Format, encode};
pub use error::IoError;
pub use workbook::{Workbook, WorkbookSpaces};
