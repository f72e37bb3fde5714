//! Protobuf wire format, keyed by declared field numbers.
//!
//! Repeated numeric scalars are packed. A map entry is a message with the key
//! at field 1 and the value at field 2; timestamps and durations are
//! `{1: seconds, 2: nanos}`. A union is a message carrying the discriminator
//! at [`UNION_TYPE_FIELD`] and the payload at the field numbered by the
//! discriminator value.

use tabulon_core::{Document, MapKey, Message, UnionValue, Value};
use tabulon_spec::{ElemKind, FieldKind, MessageDescriptor, ScalarKind, UnionDescriptor};

use super::{Format, duration_parts, is_set, mismatch, timestamp_parts};
use crate::error::IoError;

/// Field number of the discriminator inside an encoded union.
pub const UNION_TYPE_FIELD: u32 = 9999;

const VARINT: u32 = 0;
const FIXED64: u32 = 1;
const LEN: u32 = 2;
const FIXED32: u32 = 5;

pub fn encode(doc: &Document) -> Result<Vec<u8>, IoError> {
    let mut buf = Vec::new();
    message(&mut buf, &doc.schema, &doc.root)?;
    Ok(buf)
}

fn put_varint(buf: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        buf.push((v as u8) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

fn put_tag(buf: &mut Vec<u8>, number: u32, wire: u32) {
    put_varint(buf, (u64::from(number) << 3) | u64::from(wire));
}

fn put_len(buf: &mut Vec<u8>, number: u32, bytes: &[u8]) {
    put_tag(buf, number, LEN);
    put_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn put_seconds_nanos(buf: &mut Vec<u8>, number: u32, (seconds, nanos): (i64, i32)) {
    let mut inner = Vec::new();
    if seconds != 0 {
        put_tag(&mut inner, 1, VARINT);
        put_varint(&mut inner, seconds as u64);
    }
    if nanos != 0 {
        put_tag(&mut inner, 2, VARINT);
        put_varint(&mut inner, i64::from(nanos) as u64);
    }
    put_len(buf, number, &inner);
}

/// Scalars whose repeated form is packed.
fn packable(kind: &ScalarKind) -> bool {
    !matches!(
        kind,
        ScalarKind::String | ScalarKind::Bytes | ScalarKind::Timestamp | ScalarKind::Duration
    )
}

/// Raw payload of a packable scalar, without a tag.
fn packed_value(buf: &mut Vec<u8>, name: &str, kind: &ScalarKind, value: &Value) -> Result<(), IoError> {
    match (kind, value) {
        // Negative int32 values are sign-extended to ten bytes.
        (ScalarKind::Int32 | ScalarKind::Int64, Value::Int(v)) => put_varint(buf, *v as u64),
        (ScalarKind::Uint32 | ScalarKind::Uint64, Value::Uint(v)) => put_varint(buf, *v),
        (ScalarKind::Bool, Value::Bool(v)) => put_varint(buf, u64::from(*v)),
        (ScalarKind::Enum(_), Value::Enum(v)) => put_varint(buf, i64::from(*v) as u64),
        (ScalarKind::Float, Value::Float(v)) => buf.extend_from_slice(&(*v as f32).to_le_bytes()),
        (ScalarKind::Double, Value::Float(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (kind, value) => return Err(mismatch(Format::Binary, name, kind, value)),
    }
    Ok(())
}

fn wire_type(kind: &ScalarKind) -> u32 {
    match kind {
        ScalarKind::Float => FIXED32,
        ScalarKind::Double => FIXED64,
        ScalarKind::String | ScalarKind::Bytes | ScalarKind::Timestamp | ScalarKind::Duration => LEN,
        _ => VARINT,
    }
}

fn scalar(
    buf: &mut Vec<u8>,
    number: u32,
    name: &str,
    kind: &ScalarKind,
    value: &Value,
) -> Result<(), IoError> {
    match (kind, value) {
        (ScalarKind::String, Value::String(v)) => put_len(buf, number, v.as_bytes()),
        (ScalarKind::Bytes, Value::Bytes(v)) => put_len(buf, number, v),
        (ScalarKind::Timestamp, Value::Timestamp(ts)) => {
            put_seconds_nanos(buf, number, timestamp_parts(ts))
        }
        (ScalarKind::Duration, Value::Duration(d)) => put_seconds_nanos(buf, number, duration_parts(d)),
        (kind, value) => {
            put_tag(buf, number, wire_type(kind));
            packed_value(buf, name, kind, value)?;
        }
    }
    Ok(())
}

fn map_key(buf: &mut Vec<u8>, name: &str, kind: &ScalarKind, key: &MapKey) -> Result<(), IoError> {
    let value = match key {
        MapKey::Bool(v) => Value::Bool(*v),
        MapKey::Int(v) => Value::Int(*v),
        MapKey::Uint(v) => Value::Uint(*v),
        MapKey::String(v) => Value::String(v.clone()),
    };
    scalar(buf, 1, name, kind, &value)
}

fn elem(buf: &mut Vec<u8>, number: u32, name: &str, kind: &ElemKind, value: &Value) -> Result<(), IoError> {
    match (kind, value) {
        (ElemKind::Scalar(kind), value) => scalar(buf, number, name, kind, value),
        (ElemKind::Message(desc), Value::Message(msg)) => {
            let mut inner = Vec::new();
            message(&mut inner, desc, msg)?;
            put_len(buf, number, &inner);
            Ok(())
        }
        (ElemKind::Message(desc), value) => Err(mismatch(Format::Binary, name, &desc.name, value)),
    }
}

fn union(
    buf: &mut Vec<u8>,
    number: u32,
    name: &str,
    desc: &UnionDescriptor,
    value: &UnionValue,
) -> Result<(), IoError> {
    let mut inner = Vec::new();
    put_tag(&mut inner, UNION_TYPE_FIELD, VARINT);
    put_varint(&mut inner, i64::from(value.discriminator) as u64);
    if let Some(variant) = desc.variant(value.discriminator) {
        let payload_number = u32::try_from(value.discriminator).map_err(|_| IoError::Encode {
            format: Format::Binary.to_string(),
            message: format!(
                "field `{name}`: union `{}` discriminator {} cannot be a field number",
                desc.name, value.discriminator
            ),
        })?;
        let mut payload = Vec::new();
        message(&mut payload, &variant.message, &value.payload)?;
        put_len(&mut inner, payload_number, &payload);
    }
    put_len(buf, number, &inner);
    Ok(())
}

fn field(buf: &mut Vec<u8>, number: u32, name: &str, kind: &FieldKind, value: &Value) -> Result<(), IoError> {
    match (kind, value) {
        (FieldKind::Scalar(kind), value) => scalar(buf, number, name, kind, value),
        (FieldKind::Message(desc), Value::Message(msg)) => {
            let mut inner = Vec::new();
            message(&mut inner, desc, msg)?;
            put_len(buf, number, &inner);
            Ok(())
        }
        (FieldKind::List(ElemKind::Scalar(kind)), Value::List(items)) if packable(kind) => {
            if items.is_empty() {
                return Ok(());
            }
            let mut packed = Vec::new();
            for item in items {
                packed_value(&mut packed, name, kind, item)?;
            }
            put_len(buf, number, &packed);
            Ok(())
        }
        (FieldKind::List(kind), Value::List(items)) => {
            for item in items {
                elem(buf, number, name, kind, item)?;
            }
            Ok(())
        }
        (FieldKind::Map { key, value: kind }, Value::Map(entries)) => {
            for (k, item) in entries {
                let mut entry = Vec::new();
                map_key(&mut entry, name, key, k)?;
                elem(&mut entry, 2, name, kind, item)?;
                put_len(buf, number, &entry);
            }
            Ok(())
        }
        (FieldKind::Union(desc), Value::Union(u)) => union(buf, number, name, desc, u),
        (kind, value) => Err(mismatch(Format::Binary, name, kind, value)),
    }
}

fn message(buf: &mut Vec<u8>, desc: &MessageDescriptor, msg: &Message) -> Result<(), IoError> {
    for fd in &desc.fields {
        if let Some(value) = msg.get(fd.number) {
            if is_set(msg, fd, value) {
                field(buf, fd.number, &fd.name, &fd.kind, value)?;
            }
        }
    }
    Ok(())
}
