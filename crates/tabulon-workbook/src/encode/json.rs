//! proto3 JSON mapping.

use serde_json::{Map, Number, Value as Json};
use tabulon_core::codec::default_value;
use tabulon_core::{Document, MapKey, Message, UnionValue, Value};
use tabulon_spec::{ElemKind, FieldKind, MessageDescriptor, ScalarKind, UnionDescriptor};

use super::{
    EncodeOptions, Format, duration_string, is_set, lower_camel, mismatch, timestamp_string,
};
use crate::error::IoError;

pub fn encode(doc: &Document, options: &EncodeOptions) -> Result<Vec<u8>, IoError> {
    let value = to_json(doc, options)?;
    let out = if options.pretty {
        serde_json::to_vec_pretty(&value)
    } else {
        serde_json::to_vec(&value)
    };
    out.map_err(|e| IoError::Encode {
        format: Format::Json.to_string(),
        message: e.to_string(),
    })
}

/// Document root as a JSON value.
pub fn to_json(doc: &Document, options: &EncodeOptions) -> Result<Json, IoError> {
    JsonWriter { options }.message(&doc.schema, &doc.root)
}

struct JsonWriter<'o> {
    options: &'o EncodeOptions,
}

impl JsonWriter<'_> {
    fn name(&self, name: &str) -> String {
        if self.options.proto_names {
            name.to_string()
        } else {
            lower_camel(name)
        }
    }

    fn message(&self, desc: &MessageDescriptor, msg: &Message) -> Result<Json, IoError> {
        let mut out = Map::new();
        for field in &desc.fields {
            let value = match msg.get(field.number) {
                Some(value) if self.options.emit_defaults || is_set(msg, field, value) => {
                    self.field(&field.name, &field.kind, value)?
                }
                Some(_) => continue,
                None if self.options.emit_defaults => match self.zero(&field.kind) {
                    Some(zero) => self.field(&field.name, &field.kind, &zero)?,
                    None => continue,
                },
                None => continue,
            };
            out.insert(self.name(&field.name), value);
        }
        Ok(Json::Object(out))
    }

    /// Zero value written for an unset field; unions have none.
    fn zero(&self, kind: &FieldKind) -> Option<Value> {
        Some(match kind {
            FieldKind::Scalar(kind) => default_value(kind),
            FieldKind::Message(_) => Value::Message(Message::new()),
            FieldKind::List(_) => Value::List(Vec::new()),
            FieldKind::Map { .. } => Value::Map(Default::default()),
            FieldKind::Union(_) => return None,
        })
    }

    fn field(&self, name: &str, kind: &FieldKind, value: &Value) -> Result<Json, IoError> {
        match (kind, value) {
            (FieldKind::Scalar(kind), value) => scalar(name, kind, value),
            (FieldKind::Message(desc), Value::Message(msg)) => self.message(desc, msg),
            (FieldKind::List(elem), Value::List(items)) => items
                .iter()
                .map(|item| self.elem(name, elem, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array),
            (FieldKind::Map { value: elem, .. }, Value::Map(entries)) => {
                let mut out = Map::new();
                for (key, item) in entries {
                    out.insert(map_key(key), self.elem(name, elem, item)?);
                }
                Ok(Json::Object(out))
            }
            (FieldKind::Union(union), Value::Union(u)) => self.union(name, union, u),
            (kind, value) => Err(mismatch(Format::Json, name, kind, value)),
        }
    }

    fn elem(&self, name: &str, kind: &ElemKind, value: &Value) -> Result<Json, IoError> {
        match (kind, value) {
            (ElemKind::Scalar(kind), value) => scalar(name, kind, value),
            (ElemKind::Message(desc), Value::Message(msg)) => self.message(desc, msg),
            (ElemKind::Message(desc), value) => Err(mismatch(Format::Json, name, &desc.name, value)),
        }
    }

    /// `{"type": "<VALUE_NAME>", "<payloadName>": {...}}`
    fn union(&self, name: &str, desc: &UnionDescriptor, value: &UnionValue) -> Result<Json, IoError> {
        let mut out = Map::new();
        let type_name = desc
            .discriminator
            .by_number(value.discriminator)
            .map(|v| Json::String(v.name.clone()))
            .unwrap_or_else(|| Json::from(value.discriminator));
        out.insert("type".to_string(), type_name);
        if let Some(variant) = desc.variant(value.discriminator) {
            out.insert(
                lower_camel_type(&variant.message.name),
                self.message(&variant.message, &value.payload)?,
            );
        } else if value.discriminator != 0 {
            return Err(IoError::Encode {
                format: Format::Json.to_string(),
                message: format!(
                    "field `{name}`: union `{}` has no variant {}",
                    desc.name, value.discriminator
                ),
            });
        }
        Ok(Json::Object(out))
    }
}

/// `PvpPayload` -> `pvpPayload`.
fn lower_camel_type(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn map_key(key: &MapKey) -> String {
    key.to_string()
}

fn float(v: f64) -> Json {
    match Number::from_f64(v) {
        Some(n) => Json::Number(n),
        None if v.is_nan() => Json::String("NaN".to_string()),
        None if v > 0.0 => Json::String("Infinity".to_string()),
        None => Json::String("-Infinity".to_string()),
    }
}

fn scalar(name: &str, kind: &ScalarKind, value: &Value) -> Result<Json, IoError> {
    Ok(match (kind, value) {
        (ScalarKind::Int32, Value::Int(v)) => Json::from(*v),
        (ScalarKind::Int64, Value::Int(v)) => Json::String(v.to_string()),
        (ScalarKind::Uint32, Value::Uint(v)) => Json::from(*v),
        (ScalarKind::Uint64, Value::Uint(v)) => Json::String(v.to_string()),
        (ScalarKind::Float | ScalarKind::Double, Value::Float(v)) => float(*v),
        (ScalarKind::Bool, Value::Bool(v)) => Json::Bool(*v),
        (ScalarKind::String, Value::String(v)) => Json::String(v.clone()),
        (ScalarKind::Bytes, Value::Bytes(v)) => Json::String(String::from_utf8_lossy(v).into_owned()),
        (ScalarKind::Enum(desc), Value::Enum(v)) => match desc.by_number(*v) {
            Some(ev) => Json::String(ev.name.clone()),
            None => Json::from(*v),
        },
        (ScalarKind::Timestamp, Value::Timestamp(ts)) => Json::String(timestamp_string(ts)),
        (ScalarKind::Duration, Value::Duration(d)) => Json::String(duration_string(d)),
        (kind, value) => return Err(mismatch(Format::Json, name, kind, value)),
    })
}
