use tabulon_spec::{ElemKind, FieldDescriptor, FieldKind, Layout, MessageDescriptor, ScalarKind};

use super::{Parser, split_incell, store};
use crate::codec::{default_value, parse_scalar};
use crate::cursor::RowCells;
use crate::error::{ErrorKind, ParseError, ResultExt};
use crate::options::FieldOptions;
use crate::validate::{Continuity, check_sequence, must_be_unique, pad_list};
use crate::value::{MapKey, Message, Value};

/// Key field of a keyed list element: the field whose column name equals
/// the annotated key, else the first field.
struct KeyField<'d> {
    number: u32,
    name: String,
    kind: &'d ScalarKind,
}

impl Parser<'_> {
    pub(super) fn parse_list_field(
        &self,
        field: &FieldDescriptor,
        elem: &ElemKind,
        opts: &FieldOptions,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        match opts.layout {
            Layout::Vertical => self.parse_vertical_list(field, elem, opts, msg, row, prefix),
            Layout::Incell => self.parse_incell_list(field, elem, opts, msg, row, prefix),
            Layout::Horizontal | Layout::Default => {
                self.parse_horizontal_list(field, elem, opts, msg, row, prefix)
            }
        }
    }

    fn key_field<'d>(&self, desc: &'d MessageDescriptor, opts: &FieldOptions) -> Result<KeyField<'d>, ErrorKind> {
        let field = desc
            .fields
            .iter()
            .find(|f| self.options(f).name == opts.key)
            .or_else(|| desc.fields.first())
            .ok_or_else(|| ErrorKind::unsupported(format!("keyed list of empty message `{}`", desc.name)))?;
        match &field.kind {
            FieldKind::Scalar(kind) => Ok(KeyField {
                number: field.number,
                name: self.options(field).name,
                kind,
            }),
            _ => Err(ErrorKind::unsupported(format!(
                "key field `{}.{}` must be a scalar",
                desc.name, field.name
            ))),
        }
    }

    /// One element per row. Keyed lists of messages merge rows sharing a key
    /// into one element when duplicates are allowed.
    fn parse_vertical_list(
        &self,
        field: &FieldDescriptor,
        elem: &ElemKind,
        opts: &FieldOptions,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        let base = format!("{prefix}{}", opts.name);
        let was = msg.has(field.number);
        let mut items = take_list(msg, field.number);

        match elem {
            ElemKind::Message(desc) if opts.keyed => {
                self.vertical_keyed_elem(desc, opts, &mut items, row, &base)?;
            }
            ElemKind::Message(desc) => {
                let mut value = Message::new();
                if self.parse_message(desc, &mut value, row, &base)? {
                    items.push(Value::Message(value));
                }
            }
            ElemKind::Scalar(kind) => {
                let cell = row.cell(&base, opts.optional)?;
                let (value, present) = self
                    .cell_scalar(kind, opts, cell)
                    .at(|| row.context(&base))?;
                if present {
                    items.push(value);
                }
            }
        }

        let present = was || !items.is_empty();
        store(msg, field.number, Value::List(items), present);
        Ok(present)
    }

    fn vertical_keyed_elem(
        &self,
        desc: &MessageDescriptor,
        opts: &FieldOptions,
        items: &mut Vec<Value>,
        row: &RowCells<'_>,
        base: &str,
    ) -> Result<(), ParseError> {
        let key = self.key_field(desc, opts).at(|| row.group_context(base))?;
        let key_column = format!("{base}{}", key.name);
        let cell = row.cell(&key_column, opts.optional)?;
        let (key_value, key_given) =
            parse_scalar(key.kind, &cell.data, &self.ctx.locale).at(|| row.context(&key_column))?;

        let existing = if key_given {
            items.iter().position(|item| elem_key(item, &key) == key_value)
        } else {
            None
        };
        let Some(index) = existing else {
            let mut value = Message::new();
            if self.parse_message(desc, &mut value, row, base)? {
                if key_given {
                    self.check_value(key.kind, opts, &key_value, &cell.data)
                        .at(|| row.context(&key_column))?;
                    if let Some(start) = opts.prop.sequence {
                        let map_key = list_key(&key_value).at(|| row.context(&key_column))?;
                        check_sequence(start, max_key(items, &key), &map_key)
                            .at(|| row.context(&key_column))?;
                    }
                }
                items.push(Value::Message(value));
            }
            return Ok(());
        };

        if must_be_unique(opts, Some(desc)) {
            let mut scratch = Message::new();
            let value_present = self.parse_message(desc, &mut scratch, row, base)?;
            if cell.is_present() || value_present {
                return Err(ParseError::new(ErrorKind::DuplicateKey {
                    key: cell.data.trim().to_string(),
                })
                .with_context(row.context(&key_column)));
            }
            return Ok(());
        }
        let mut merged = match items.get_mut(index).and_then(Value::as_message_mut) {
            Some(m) => std::mem::take(m),
            None => Message::new(),
        };
        self.parse_message(desc, &mut merged, row, base)?;
        items[index] = Value::Message(merged);
        Ok(())
    }

    /// Elements in numbered column groups `{Name}1`, `{Name}2`, ... of one
    /// row. Taken from the first row that populates it.
    fn parse_horizontal_list(
        &self,
        field: &FieldDescriptor,
        elem: &ElemKind,
        opts: &FieldOptions,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        if msg.has(field.number) {
            return Ok(true);
        }
        let base = format!("{prefix}{}", opts.name);
        let detected = row.count_with_prefix(&base);
        let scan = opts.prop.size.unwrap_or(detected);
        #[cfg(feature = "tracing")]
        if scan < detected {
            tracing::debug!(column = %base, detected, size = scan, "columns beyond declared size ignored");
        }

        let key = match elem {
            ElemKind::Message(desc) if opts.keyed => {
                Some(self.key_field(desc, opts).at(|| row.group_context(&base))?)
            }
            _ => None,
        };
        let unique = must_be_unique(opts, None);

        let mut items = Vec::new();
        let mut continuity = Continuity::default();
        for i in 1..=scan {
            if i > detected {
                continuity
                    .observe(i, false)
                    .at(|| row.group_context(&base))?;
                continue;
            }
            let elem_name = format!("{base}{i}");
            let (value, present) = match elem {
                ElemKind::Message(desc) => {
                    let mut value = Message::new();
                    let present = self.parse_message(desc, &mut value, row, &elem_name)?;
                    (Value::Message(value), present)
                }
                ElemKind::Scalar(kind) => {
                    let cell = row.cell(&elem_name, opts.optional)?;
                    self.cell_scalar(kind, opts, cell)
                        .at(|| row.context(&elem_name))?
                }
            };
            continuity
                .observe(i, present)
                .at(|| row.group_context(&elem_name))?;
            if !present {
                continue;
            }
            if let Some(key) = &key {
                let key_column = format!("{elem_name}{}", key.name);
                self.check_keyed_elem(opts, key, unique, &items, &value)
                    .at(|| row.context(&key_column))?;
            }
            items.push(value);
        }

        let populated = !items.is_empty();
        if let Some(size) = opts.prop.size.or(opts.prop.fixed.then_some(detected)) {
            pad_list(&mut items, size, elem);
        }
        if populated || !items.is_empty() {
            store(msg, field.number, Value::List(items), populated);
        }
        Ok(populated)
    }

    /// Elements split from one cell by `sep`; message elements are split
    /// again by `subsep`.
    fn parse_incell_list(
        &self,
        field: &FieldDescriptor,
        elem: &ElemKind,
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
        let mut items = self
            .incell_list(elem, opts, &cell.data)
            .at(|| row.context(&name))?;
        let populated = !items.is_empty();
        if let Some(size) = opts.prop.size {
            pad_list(&mut items, size, elem);
        }
        if populated || !items.is_empty() {
            store(msg, field.number, Value::List(items), populated);
        }
        Ok(populated)
    }

    pub(crate) fn incell_list(
        &self,
        elem: &ElemKind,
        opts: &FieldOptions,
        text: &str,
    ) -> Result<Vec<Value>, ErrorKind> {
        let parts = split_incell(text, &opts.sep)?;
        let key = match elem {
            ElemKind::Message(desc) if opts.keyed => Some(self.key_field(desc, opts)?),
            _ => None,
        };
        let unique = must_be_unique(opts, None);

        let mut items = Vec::with_capacity(parts.len());
        for part in parts {
            let value = match elem {
                ElemKind::Scalar(kind) => self.text_scalar(kind, opts, part)?.0,
                ElemKind::Message(desc) => {
                    let mut value = Message::new();
                    let fields: Vec<&str> = part.split(opts.subsep.as_str()).map(str::trim).collect();
                    self.fill_positional(desc, &mut value, &fields)?;
                    Value::Message(value)
                }
            };
            if let Some(key) = &key {
                self.check_keyed_elem(opts, key, unique, &items, &value)?;
            }
            items.push(value);
        }
        Ok(items)
    }

    /// Uniqueness and sequence checks of a new keyed element against the
    /// elements before it.
    fn check_keyed_elem(
        &self,
        opts: &FieldOptions,
        key: &KeyField<'_>,
        unique: bool,
        items: &[Value],
        value: &Value,
    ) -> Result<(), ErrorKind> {
        let key_value = elem_key(value, key);
        if unique && items.iter().any(|item| elem_key(item, key) == key_value) {
            return Err(ErrorKind::DuplicateKey {
                key: key_value.to_string(),
            });
        }
        if let Some(start) = opts.prop.sequence {
            check_sequence(start, max_key(items, key), &list_key(&key_value)?)?;
        }
        Ok(())
    }
}

fn take_list(msg: &mut Message, number: u32) -> Vec<Value> {
    match msg.take(number) {
        Some(Value::List(items)) => items,
        _ => Vec::new(),
    }
}

/// Key of a list element, defaulting when the key field is unset.
fn elem_key(item: &Value, key: &KeyField<'_>) -> Value {
    item.as_message()
        .and_then(|m| m.get(key.number))
        .cloned()
        .unwrap_or_else(|| default_value(key.kind))
}

fn list_key(value: &Value) -> Result<MapKey, ErrorKind> {
    value
        .to_map_key()
        .ok_or_else(|| ErrorKind::unsupported(format!("`{value}` cannot be used as a list key")))
}

fn max_key(items: &[Value], key: &KeyField<'_>) -> Option<i64> {
    items
        .iter()
        .filter_map(|item| elem_key(item, key).to_map_key()?.as_i64())
        .max()
}
