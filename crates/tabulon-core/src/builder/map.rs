use std::collections::BTreeMap;

use tabulon_spec::{ElemKind, FieldDescriptor, Layout, ScalarKind};

use super::{Parser, split_incell, store};
use crate::codec::{default_elem, default_value, parse_scalar};
use crate::cursor::RowCells;
use crate::error::{ErrorKind, ParseError, ResultExt};
use crate::options::FieldOptions;
use crate::validate::{Continuity, check_sequence, must_be_unique};
use crate::value::{MapKey, Message, Value};

type Entries = BTreeMap<MapKey, Value>;

/// Column suffix of a scalar map value.
const VALUE_SUFFIX: &str = "Value";

impl Parser<'_> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn parse_map_field(
        &self,
        field: &FieldDescriptor,
        key_kind: &ScalarKind,
        value: &ElemKind,
        opts: &FieldOptions,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        match opts.layout {
            Layout::Horizontal => {
                self.parse_horizontal_map(field, key_kind, value, opts, msg, row, prefix)
            }
            Layout::Incell => self.parse_incell_map(field, key_kind, value, opts, msg, row, prefix),
            Layout::Vertical | Layout::Default => {
                self.parse_vertical_map(field, key_kind, value, opts, msg, row, prefix)
            }
        }
    }

    /// Key of a map entry: `(key, given)`, with `range`/`refer` applied to
    /// given keys.
    fn map_key(
        &self,
        kind: &ScalarKind,
        opts: &FieldOptions,
        text: &str,
    ) -> Result<(MapKey, bool), ErrorKind> {
        let (value, given) = parse_scalar(kind, text, &self.ctx.locale)?;
        if given {
            self.check_value(kind, opts, &value, text)?;
        }
        let key = value
            .to_map_key()
            .ok_or_else(|| ErrorKind::unsupported(format!("`{kind}` cannot be used as a map key")))?;
        Ok((key, given))
    }

    /// Parse the value of the entry rooted at `elem_name` into `slot`. The
    /// field's props belong to the key, so scalar values are read as is.
    fn map_value(
        &self,
        value: &ElemKind,
        opts: &FieldOptions,
        slot: &mut Value,
        row: &RowCells<'_>,
        elem_name: &str,
    ) -> Result<bool, ParseError> {
        match value {
            ElemKind::Message(desc) => {
                let mut entry = match slot.as_message_mut() {
                    Some(m) => std::mem::take(m),
                    None => Message::new(),
                };
                let present = self.parse_message(desc, &mut entry, row, elem_name)?;
                *slot = Value::Message(entry);
                Ok(present)
            }
            ElemKind::Scalar(kind) => {
                let column = format!("{elem_name}{VALUE_SUFFIX}");
                let cell = row.cell(&column, opts.optional)?;
                let (parsed, present) = parse_scalar(kind, &cell.data, &self.ctx.locale)
                    .at(|| row.context(&column))?;
                if present {
                    *slot = parsed;
                }
                Ok(present)
            }
        }
    }

    /// One entry per row: key column `{Name}{Key}`, value columns under
    /// `{Name}`. Rows repeating a key add to the same entry when the map
    /// allows duplicates.
    #[allow(clippy::too_many_arguments)]
    fn parse_vertical_map(
        &self,
        field: &FieldDescriptor,
        key_kind: &ScalarKind,
        value: &ElemKind,
        opts: &FieldOptions,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        let base = format!("{prefix}{}", opts.name);
        let key_column = format!("{base}{}", opts.key);
        let was = msg.has(field.number);
        let mut entries = take_map(msg, field.number);

        let cell = row.cell(&key_column, opts.optional)?;
        let (key, key_given) = self
            .map_key(key_kind, opts, &cell.data)
            .at(|| row.context(&key_column))?;
        let value_desc = match value {
            ElemKind::Message(desc) => Some(desc.as_ref()),
            ElemKind::Scalar(_) => None,
        };

        let result = if key_given && entries.contains_key(&key) {
            if must_be_unique(opts, value_desc) {
                let mut scratch = default_elem(value);
                let value_present = self.map_value(value, opts, &mut scratch, row, &base)?;
                if cell.is_present() || value_present {
                    Err(ParseError::new(ErrorKind::DuplicateKey {
                        key: key.to_string(),
                    })
                    .with_context(row.context(&key_column)))
                } else {
                    Ok(())
                }
            } else {
                match entries.get_mut(&key) {
                    Some(slot) => self.map_value(value, opts, slot, row, &base).map(|_| ()),
                    None => Ok(()),
                }
            }
        } else {
            let mut slot = default_elem(value);
            let value_present = self.map_value(value, opts, &mut slot, row, &base)?;
            self.insert_entry(&mut entries, key, key_given, value_present, slot, opts)
                .at(|| row.context(&key_column))
        };
        let present = was || !entries.is_empty();
        store(msg, field.number, Value::Map(entries), present);
        result?;
        Ok(present)
    }

    /// Entries in numbered column groups `{Name}1{Key}`, `{Name}1...` of one
    /// row. Taken from the first row that populates it.
    #[allow(clippy::too_many_arguments)]
    fn parse_horizontal_map(
        &self,
        field: &FieldDescriptor,
        key_kind: &ScalarKind,
        value: &ElemKind,
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
        let unique = must_be_unique(opts, None);

        let mut entries = Entries::new();
        let mut continuity = Continuity::default();
        for i in 1..=scan {
            if i > detected {
                continuity
                    .observe(i, false)
                    .at(|| row.group_context(&base))?;
                continue;
            }
            let elem_name = format!("{base}{i}");
            let key_column = format!("{elem_name}{}", opts.key);
            let cell = row.cell(&key_column, opts.optional)?;
            let (key, key_given) = self
                .map_key(key_kind, opts, &cell.data)
                .at(|| row.context(&key_column))?;
            let mut slot = default_elem(value);
            let value_present = self.map_value(value, opts, &mut slot, row, &elem_name)?;

            let present = cell.is_present() || value_present;
            continuity
                .observe(i, present)
                .at(|| row.group_context(&elem_name))?;
            if !present {
                continue;
            }
            if key_given && entries.contains_key(&key) {
                if unique {
                    return Err(ParseError::new(ErrorKind::DuplicateKey {
                        key: key.to_string(),
                    })
                    .with_context(row.context(&key_column)));
                }
                entries.insert(key, slot);
                continue;
            }
            self.insert_entry(&mut entries, key, key_given, value_present, slot, opts)
                .at(|| row.context(&key_column))?;
        }

        let populated = !entries.is_empty();
        if populated {
            store(msg, field.number, Value::Map(entries), true);
        }
        Ok(populated)
    }

    /// `key:value` pairs split from one cell by `sep`, key and value split
    /// by `subsep`. Message values take all parts positionally, so their
    /// first field receives the key.
    #[allow(clippy::too_many_arguments)]
    fn parse_incell_map(
        &self,
        field: &FieldDescriptor,
        key_kind: &ScalarKind,
        value: &ElemKind,
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
        let entries = self
            .incell_map(key_kind, value, opts, &cell.data)
            .at(|| row.context(&name))?;
        let populated = !entries.is_empty();
        if populated {
            store(msg, field.number, Value::Map(entries), true);
        }
        Ok(populated)
    }

    pub(crate) fn incell_map(
        &self,
        key_kind: &ScalarKind,
        value: &ElemKind,
        opts: &FieldOptions,
        text: &str,
    ) -> Result<Entries, ErrorKind> {
        let unique = must_be_unique(opts, None);
        let mut entries = Entries::new();
        for pair in split_incell(text, &opts.sep)? {
            let parts: Vec<&str> = pair.split(opts.subsep.as_str()).map(str::trim).collect();
            let (key, _) = self.map_key(key_kind, opts, parts[0])?;
            let entry = match value {
                ElemKind::Scalar(kind) => {
                    let rest = parts[1..].join(&opts.subsep);
                    match parse_scalar(kind, &rest, &self.ctx.locale)? {
                        (parsed, true) => parsed,
                        (_, false) => default_value(kind),
                    }
                }
                ElemKind::Message(desc) => {
                    let mut entry = Message::new();
                    self.fill_positional(desc, &mut entry, &parts)?;
                    Value::Message(entry)
                }
            };
            if entries.contains_key(&key) {
                if unique {
                    return Err(ErrorKind::DuplicateKey {
                        key: key.to_string(),
                    });
                }
            } else if let Some(start) = opts.prop.sequence {
                check_sequence(start, max_key(&entries), &key)?;
            }
            entries.insert(key, entry);
        }
        Ok(entries)
    }

    /// Insert a new entry. A blank key with a populated value lands on the
    /// key type's default, unless that key is already taken.
    fn insert_entry(
        &self,
        entries: &mut Entries,
        key: MapKey,
        key_given: bool,
        value_present: bool,
        slot: Value,
        opts: &FieldOptions,
    ) -> Result<(), ErrorKind> {
        if !key_given {
            if !value_present {
                return Ok(());
            }
            if entries.contains_key(&key) {
                return Err(ErrorKind::ValuePresentUnderMissingKey {
                    key: key.to_string(),
                });
            }
            entries.insert(key, slot);
            return Ok(());
        }
        if let Some(start) = opts.prop.sequence {
            check_sequence(start, max_key(entries), &key)?;
        }
        entries.insert(key, slot);
        Ok(())
    }
}

fn take_map(msg: &mut Message, number: u32) -> Entries {
    match msg.take(number) {
        Some(Value::Map(entries)) => entries,
        _ => Entries::new(),
    }
}


fn max_key(entries: &Entries) -> Option<i64> {
    entries.keys().filter_map(MapKey::as_i64).max()
}
