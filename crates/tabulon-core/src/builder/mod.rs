//! Row-to-message builder.
//!
//! [`Parser::parse_message`] walks a message descriptor against one row and
//! fills the target message in place. Every field handler returns whether the
//! field is present afterwards; the message is present when any field is.
//!
//! Rows of a vertical group are fed one at a time into the same target, so
//! handlers must be re-entrant: scalars and single-row collections keep the
//! first populated value, vertical collections grow with each row.

mod list;
mod map;
mod union;

use tabulon_spec::{FieldDescriptor, FieldKind, MessageDescriptor, ScalarKind, Span};

use crate::codec::parse_scalar;
use crate::context::BuildContext;
use crate::cursor::{Cell, RowCells};
use crate::error::{ErrorKind, FieldFrame, ParseError, ResultExt};
use crate::options::{FieldOptions, SheetDefaults};
use crate::validate::check_range;
use crate::value::{Message, Value};

pub struct Parser<'c> {
    ctx: &'c BuildContext,
    defaults: &'c SheetDefaults,
}

impl<'c> Parser<'c> {
    pub fn new(ctx: &'c BuildContext, defaults: &'c SheetDefaults) -> Self {
        Self { ctx, defaults }
    }

    pub(crate) fn options(&self, field: &FieldDescriptor) -> FieldOptions {
        FieldOptions::resolve(field, self.defaults)
    }

    /// Populate `msg` from `row`, reading columns named `prefix` + field name.
    pub fn parse_message(
        &self,
        desc: &MessageDescriptor,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        let mut present = false;
        for field in &desc.fields {
            let opts = self.options(field);
            let field_present = self
                .parse_field(field, &opts, msg, row, prefix)
                .map_err(|err| {
                    err.with_frame(FieldFrame {
                        type_name: desc.name.clone(),
                        field: field.name.clone(),
                        options: opts.to_string(),
                    })
                })?;
            present |= field_present;
        }
        Ok(present)
    }

    fn parse_field(
        &self,
        field: &FieldDescriptor,
        opts: &FieldOptions,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        match &field.kind {
            FieldKind::Scalar(kind) => self.parse_scalar_field(field, kind, opts, msg, row, prefix),
            FieldKind::Message(child) => {
                self.parse_message_field(field, child, opts, msg, row, prefix)
            }
            FieldKind::List(elem) => self.parse_list_field(field, elem, opts, msg, row, prefix),
            FieldKind::Map { key, value } => {
                self.parse_map_field(field, key, value, opts, msg, row, prefix)
            }
            FieldKind::Union(union) => self.parse_union_field(field, union, opts, msg, row, prefix),
        }
    }

    fn parse_scalar_field(
        &self,
        field: &FieldDescriptor,
        kind: &ScalarKind,
        opts: &FieldOptions,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        if msg.has(field.number) {
            return Ok(true);
        }
        let name = format!("{prefix}{}", opts.name);
        let cell = row.cell(&name, opts.optional)?;
        let (value, present) = self
            .cell_scalar(kind, opts, cell)
            .at(|| row.context(&name))?;
        if present {
            msg.set(field.number, value);
        } else {
            msg.set_default(field.number, value);
        }
        Ok(present)
    }

    fn parse_message_field(
        &self,
        field: &FieldDescriptor,
        child: &MessageDescriptor,
        opts: &FieldOptions,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        let name = format!("{prefix}{}", opts.name);
        if opts.span == Span::InnerCell {
            if msg.has(field.number) {
                return Ok(true);
            }
            let cell = row.cell(&name, opts.optional)?;
            let mut value = Message::new();
            let present = self
                .incell_message(child, &mut value, &cell.data, &opts.sep)
                .at(|| row.context(&name))?;
            if present {
                msg.set(field.number, Value::Message(value));
            }
            return Ok(present);
        }

        let was = msg.has(field.number);
        let mut value = match msg.take(field.number) {
            Some(Value::Message(m)) => m,
            _ => Message::new(),
        };
        let present = self.parse_message(child, &mut value, row, &name)? || was;
        if present {
            msg.set(field.number, Value::Message(value));
        }
        Ok(present)
    }

    /// Scalar from a cell. Auto-populated data keeps its value but is not
    /// presence.
    pub(crate) fn cell_scalar(
        &self,
        kind: &ScalarKind,
        opts: &FieldOptions,
        cell: &Cell<'_>,
    ) -> Result<(Value, bool), ErrorKind> {
        if cell.auto_populated {
            let (value, _) = parse_scalar(kind, &cell.data, &self.ctx.locale)?;
            return Ok((value, false));
        }
        self.text_scalar(kind, opts, &cell.data)
    }

    /// Scalar from raw text with the field's `present`, `default`, `range`
    /// and `refer` props applied.
    pub(crate) fn text_scalar(
        &self,
        kind: &ScalarKind,
        opts: &FieldOptions,
        text: &str,
    ) -> Result<(Value, bool), ErrorKind> {
        if text.trim().is_empty() {
            if opts.prop.present {
                return Err(ErrorKind::FieldNotPresent);
            }
            let fallback = opts.prop.default.as_deref().unwrap_or("");
            let (value, _) = parse_scalar(kind, fallback, &self.ctx.locale)?;
            return Ok((value, false));
        }
        let (value, present) = parse_scalar(kind, text, &self.ctx.locale)?;
        self.check_value(kind, opts, &value, text)?;
        Ok((value, present))
    }

    /// `range` and `refer` checks of a populated scalar or key.
    pub(crate) fn check_value(
        &self,
        kind: &ScalarKind,
        opts: &FieldOptions,
        value: &Value,
        text: &str,
    ) -> Result<(), ErrorKind> {
        if let Some(range) = &opts.prop.range {
            check_range(kind, value, range)?;
        }
        if let Some(reference) = &opts.prop.refer {
            self.ctx.check_refer(reference, text.trim())?;
        }
        Ok(())
    }

    /// Fill the scalar fields of `desc` positionally from `text` split by
    /// `sep`.
    pub(crate) fn incell_message(
        &self,
        desc: &MessageDescriptor,
        msg: &mut Message,
        text: &str,
        sep: &str,
    ) -> Result<bool, ErrorKind> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        let parts: Vec<&str> = text.split(sep).map(str::trim).collect();
        self.fill_positional(desc, msg, &parts)
    }

    /// Assign `parts[i]` to the i-th declared field. Missing parts leave
    /// their fields at default.
    pub(crate) fn fill_positional(
        &self,
        desc: &MessageDescriptor,
        msg: &mut Message,
        parts: &[&str],
    ) -> Result<bool, ErrorKind> {
        let mut present = false;
        for (i, field) in desc.fields.iter().enumerate() {
            let FieldKind::Scalar(kind) = &field.kind else {
                return Err(ErrorKind::unsupported(format!(
                    "`{}.{}` must be a scalar to be read from a single cell",
                    desc.name, field.name
                )));
            };
            let opts = self.options(field);
            let text = parts.get(i).copied().unwrap_or("");
            let (value, field_present) = self.text_scalar(kind, &opts, text)?;
            if field_present {
                msg.set(field.number, value);
                present = true;
            } else {
                msg.set_default(field.number, value);
            }
        }
        Ok(present)
    }
}

/// Split an in-cell collection. Trailing empty elements are dropped; an
/// empty element followed by a populated one is a gap.
pub(crate) fn split_incell<'t>(text: &'t str, sep: &str) -> Result<Vec<&'t str>, ErrorKind> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut parts: Vec<&str> = text.split(sep).map(str::trim).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    if let Some(missing) = parts.iter().position(|p| p.is_empty()) {
        let present = parts[missing..]
            .iter()
            .position(|p| !p.is_empty())
            .map_or(parts.len(), |offset| missing + offset);
        return Err(ErrorKind::NonContiguous {
            missing: missing + 1,
            present: present + 1,
        });
    }
    Ok(parts)
}

/// Store a collection value, marking it present only when populated.
pub(crate) fn store(msg: &mut Message, number: u32, value: Value, present: bool) {
    if present {
        msg.set(number, value);
    } else {
        msg.set_default(number, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incell_splitting() {
        assert_eq!(split_incell("1, 2,3", ",").unwrap(), vec!["1", "2", "3"]);
        assert_eq!(split_incell("1,2,,", ",").unwrap(), vec!["1", "2"]);
        assert!(split_incell("  ", ",").unwrap().is_empty());
        assert_eq!(
            split_incell("1,,3", ","),
            Err(ErrorKind::NonContiguous {
                missing: 2,
                present: 3
            })
        );
    }
}
