//! Build failures. A [`ParseError`] carries a fixed [`ErrorKind`], the cell
//! that caused it and the chain of fields it propagated through.

use std::fmt;

use tabulon_common::TableError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("column `{name}` not found")]
    ColumnNotFound { name: String },

    #[error("duplicate column name `{name}` in columns {first} and {second}")]
    DuplicateColumn {
        name: String,
        first: String,
        second: String,
    },

    #[error("duplicate key `{key}`")]
    DuplicateKey { key: String },

    #[error("key `{key}` is out of sequence (expected {expected})")]
    KeyNotSequent { key: String, expected: i64 },

    #[error("value `{value}` is out of range `{range}`")]
    ValueOutOfRange { value: String, range: String },

    #[error("value is present but key `{key}` is missing and already taken")]
    ValuePresentUnderMissingKey { key: String },

    #[error("element {present} is present after empty element {missing}")]
    NonContiguous { missing: usize, present: usize },

    #[error("unknown discriminator `{value}` for union `{union}`")]
    UnknownUnionDiscriminator { union: String, value: String },

    #[error("unsupported field shape: {detail}")]
    UnsupportedFieldShape { detail: String },

    #[error("value `{value}` not found in `{reference}`")]
    ReferNotFound { reference: String, value: String },

    #[error("failed to load value space `{reference}`: {message}")]
    ReferLoad { reference: String, message: String },

    #[error("invalid {kind} `{value}`: {reason}")]
    InvalidValue {
        kind: String,
        value: String,
        reason: String,
    },

    #[error("value is required but the cell is empty")]
    FieldNotPresent,

    #[error(transparent)]
    Table(#[from] TableError),
}

impl ErrorKind {
    pub(crate) fn invalid(
        kind: impl fmt::Display,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ErrorKind::InvalidValue {
            kind: kind.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(detail: impl Into<String>) -> Self {
        ErrorKind::UnsupportedFieldShape {
            detail: detail.into(),
        }
    }
}

/// Where in the sheet a failure happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellContext {
    pub sheet: String,
    /// `B5`, `B5:D5` for a column group, or `row 5` when no column matched.
    pub position: Option<String>,
    pub column: Option<String>,
    pub data: Option<String>,
}

impl CellContext {
    pub fn sheet(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for CellContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet `{}`", self.sheet)?;
        if let Some(position) = &self.position {
            write!(f, ", {position}")?;
        }
        if let Some(column) = &self.column {
            write!(f, ", column `{column}`")?;
        }
        if let Some(data) = &self.data {
            write!(f, ", data `{data}`")?;
        }
        Ok(())
    }
}

/// One enclosing field the error propagated through, innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFrame {
    pub type_name: String,
    pub field: String,
    pub options: String,
}

impl fmt::Display for FieldFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.type_name, self.field, self.options)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    kind: ErrorKind,
    context: Option<CellContext>,
    frames: Vec<FieldFrame>,
}

impl ParseError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            frames: Vec::new(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub fn context(&self) -> Option<&CellContext> {
        self.context.as_ref()
    }

    /// Enclosing fields, innermost first.
    pub fn frames(&self) -> &[FieldFrame] {
        &self.frames
    }

    /// Attach cell context. The innermost context wins.
    pub fn with_context(mut self, context: CellContext) -> Self {
        if self.context.is_none() {
            self.context = Some(context);
        }
        self
    }

    pub fn with_frame(mut self, frame: FieldFrame) -> Self {
        self.frames.push(frame);
        self
    }
}

impl From<ErrorKind> for ParseError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<TableError> for ParseError {
    fn from(err: TableError) -> Self {
        Self::new(ErrorKind::Table(err))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(context) = &self.context {
            write!(f, " [{context}]")?;
        }
        for frame in &self.frames {
            write!(f, "\n  in {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Attach context to the error side of a result.
pub(crate) trait ResultExt<T> {
    fn at(self, context: impl FnOnce() -> CellContext) -> Result<T, ParseError>;
}

impl<T, E: Into<ParseError>> ResultExt<T> for Result<T, E> {
    fn at(self, context: impl FnOnce() -> CellContext) -> Result<T, ParseError> {
        self.map_err(|e| e.into().with_context(context()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_keeps_kind_and_innermost_context() {
        let err = ParseError::new(ErrorKind::DuplicateKey { key: "1".into() })
            .with_context(CellContext {
                sheet: "Item".into(),
                position: Some("A5".into()),
                column: Some("ID".into()),
                data: Some("1".into()),
            })
            .with_context(CellContext::sheet("Other"))
            .with_frame(FieldFrame {
                type_name: "ItemConf".into(),
                field: "item_map".into(),
                options: "name=Item layout=vertical".into(),
            });

        assert_eq!(err.kind(), &ErrorKind::DuplicateKey { key: "1".into() });
        assert_eq!(err.context().map(|c| c.sheet.as_str()), Some("Item"));
        assert_eq!(err.frames().len(), 1);
        assert_eq!(
            err.to_string(),
            "duplicate key `1` [sheet `Item`, A5, column `ID`, data `1`]\n  in ItemConf.item_map (name=Item layout=vertical)"
        );
    }
}
