use tabulon_core::ParseError;
use tabulon_spec::SchemaError;
use tabulon_workbook::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("sheet `{0}` is not declared in the manifest")]
    UndeclaredSheet(String),

    #[error("failed to build sheet `{sheet}`: {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: ParseError,
    },
}

impl CompileError {
    /// Build failure of a sheet, if this is one.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            CompileError::Sheet { source, .. } => Some(source),
            _ => None,
        }
    }
}
