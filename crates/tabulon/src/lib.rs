//! Meta crate that re-exports the Tabulon building blocks and adds the
//! [`Compiler`], which builds every sheet of a manifest against a workbook.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tabulon::{CompileOptions, Compiler, EncodeOptions, Format, Manifest, Workbook, encode};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Arc::new(Manifest::from_path("tabulon.yaml")?.resolve()?);
//! let workbook = Arc::new(Workbook::open_dir("sheets")?);
//! let compiler = Compiler::new(schema, workbook, CompileOptions::default());
//! for outcome in compiler.compile_all() {
//!     let doc = outcome.result?;
//!     let bytes = encode(&doc, Format::Json, &EncodeOptions::default())?;
//!     println!("{}: {} bytes", outcome.sheet, bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod error;

pub use tabulon_common as common;
pub use tabulon_core as engine;
pub use tabulon_spec as spec;
pub use tabulon_workbook as workbook;

pub use compiler::{CompileOptions, Compiler, SheetOutcome};
pub use error::CompileError;
pub use tabulon_core::{Document, ErrorKind, ParseError};
pub use tabulon_spec::{Manifest, Schema};
pub use tabulon_workbook::{EncodeOptions, Format, IoError, Workbook, encode};
