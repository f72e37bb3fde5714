//! Tabulon engine.
//!
//! Turns the rows of a [`Table`](tabulon_common::Table) into a [`Document`]
//! shaped by a resolved message descriptor. [`SheetParser`] drives a sheet,
//! [`Parser`] fills one message from one row, and [`merge`] layers patch
//! documents on top of a built one.

mod builder;
pub mod codec;
pub mod columns;
pub mod context;
pub mod cursor;
pub mod error;
pub mod merge;
pub mod options;
pub mod refer;
pub mod sheet;
pub mod validate;
pub mod value;

pub use builder::Parser;
pub use codec::{Locale, parse_map_key, parse_scalar};
pub use columns::{Column, ColumnIndex};
pub use context::BuildContext;
pub use cursor::{Cell, RowCells};
pub use error::{CellContext, ErrorKind, FieldFrame, ParseError};
pub use merge::{merge, merge_document};
pub use options::{FieldOptions, SheetDefaults};
pub use refer::{ReferCache, ValueSpace, ValueSpaceSource};
pub use sheet::SheetParser;
pub use value::{Document, MapKey, Message, UnionValue, Value};
