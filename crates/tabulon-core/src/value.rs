//! In-memory document tree produced by the builder.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tabulon_spec::MessageDescriptor;

/// Map key. All keys of one map share a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Uint(u64),
    String(String),
}

impl MapKey {
    /// Integer view used by sequence checks.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MapKey::Int(v) => Some(*v),
            MapKey::Uint(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(v) => write!(f, "{v}"),
            MapKey::Int(v) => write!(f, "{v}"),
            MapKey::Uint(v) => write!(f, "{v}"),
            MapKey::String(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Enum(i32),
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
    Message(Message),
    List(Vec<Value>),
    Map(BTreeMap<MapKey, Value>),
    Union(UnionValue),
}

impl Value {
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut Message> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<MapKey, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a scalar into a map key.
    pub fn to_map_key(&self) -> Option<MapKey> {
        Some(match self {
            Value::Bool(v) => MapKey::Bool(*v),
            Value::Int(v) => MapKey::Int(*v),
            Value::Uint(v) => MapKey::Uint(*v),
            Value::Enum(v) => MapKey::Int(i64::from(*v)),
            Value::String(v) => MapKey::String(v.clone()),
            _ => return None,
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Bytes(v) => f.write_str(&String::from_utf8_lossy(v)),
            Value::Enum(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Duration(v) => write!(f, "{}s", v.num_milliseconds() as f64 / 1000.0),
            Value::Message(_) => f.write_str("{..}"),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Map(map) => write!(f, "{{{} entries}}", map.len()),
            Value::Union(u) => write!(f, "union({})", u.discriminator),
        }
    }
}

/// Active alternative of a tagged union.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionValue {
    pub discriminator: i32,
    pub payload: Message,
}

/// Field values keyed by field number, plus which of them were explicitly
/// populated from a cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    values: BTreeMap<u32, Value>,
    present: BTreeSet<u32>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, number: u32) -> Option<&Value> {
        self.values.get(&number)
    }

    pub fn get_mut(&mut self, number: u32) -> Option<&mut Value> {
        self.values.get_mut(&number)
    }

    pub fn has(&self, number: u32) -> bool {
        self.present.contains(&number)
    }

    /// Store a value and mark the field present.
    pub fn set(&mut self, number: u32, value: Value) {
        self.values.insert(number, value);
        self.present.insert(number);
    }

    /// Store a value without marking the field present.
    pub fn set_default(&mut self, number: u32, value: Value) {
        self.values.insert(number, value);
    }

    pub fn mark_present(&mut self, number: u32) {
        self.present.insert(number);
    }

    /// Value slot for in-place updates, created with `init` when missing.
    pub fn entry(&mut self, number: u32, init: impl FnOnce() -> Value) -> &mut Value {
        self.values.entry(number).or_insert_with(init)
    }

    pub fn take(&mut self, number: u32) -> Option<Value> {
        self.values.remove(&number)
    }

    pub fn remove(&mut self, number: u32) -> Option<Value> {
        self.present.remove(&number);
        self.values.remove(&number)
    }

    /// No field was populated from a cell.
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// All stored values in field-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.values.iter().map(|(n, v)| (*n, v))
    }

    pub fn present_fields(&self) -> impl Iterator<Item = u32> + '_ {
        self.present.iter().copied()
    }
}

/// A built sheet, ready for an encoder.
#[derive(Debug, Clone)]
pub struct Document {
    pub sheet: String,
    pub schema: Arc<MessageDescriptor>,
    pub root: Message,
    pub present: bool,
}

impl Document {
    pub fn new(sheet: impl Into<String>, schema: Arc<MessageDescriptor>) -> Self {
        Self {
            sheet: sheet.into(),
            schema,
            root: Message::new(),
            present: false,
        }
    }
}
