//! Protobuf text format.
//!
//! Field names are the declared names. Map entries are written as repeated
//! `key`/`value` blocks, timestamps and durations as `seconds`/`nanos`
//! messages, and a union as a block holding `type` plus one payload block
//! named after the variant message.

use std::fmt::Write as _;

use tabulon_core::{Document, MapKey, Message, UnionValue, Value};
use tabulon_spec::{ElemKind, FieldKind, MessageDescriptor, ScalarKind, UnionDescriptor};

use super::{
    EncodeOptions, Format, duration_parts, is_set, mismatch, snake_case, timestamp_parts,
};
use crate::error::IoError;

pub fn encode(doc: &Document, options: &EncodeOptions) -> Result<String, IoError> {
    let mut writer = TextWriter {
        out: String::new(),
        depth: 0,
        pretty: options.pretty,
    };
    writer.message(&doc.schema, &doc.root)?;
    if !options.pretty && !writer.out.is_empty() {
        writer.out.push('\n');
    }
    Ok(writer.out)
}

struct TextWriter {
    out: String,
    depth: usize,
    pretty: bool,
}

impl TextWriter {
    fn line(&mut self, text: &str) {
        if self.pretty {
            for _ in 0..self.depth {
                self.out.push_str("  ");
            }
            self.out.push_str(text);
            self.out.push('\n');
        } else {
            if !self.out.is_empty() {
                self.out.push(' ');
            }
            self.out.push_str(text);
        }
    }

    fn open(&mut self, name: &str) {
        self.line(&format!("{name} {{"));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn message(&mut self, desc: &MessageDescriptor, msg: &Message) -> Result<(), IoError> {
        for field in &desc.fields {
            match msg.get(field.number) {
                Some(value) if is_set(msg, field, value) => {
                    self.field(&field.name, &field.kind, value)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn field(&mut self, name: &str, kind: &FieldKind, value: &Value) -> Result<(), IoError> {
        match (kind, value) {
            (FieldKind::Scalar(kind), value) => self.scalar(name, kind, value),
            (FieldKind::Message(desc), Value::Message(msg)) => {
                self.open(name);
                self.message(desc, msg)?;
                self.close();
                Ok(())
            }
            (FieldKind::List(elem), Value::List(items)) => {
                for item in items {
                    self.elem(name, elem, item)?;
                }
                Ok(())
            }
            (FieldKind::Map { key, value: elem }, Value::Map(entries)) => {
                for (k, item) in entries {
                    self.open(name);
                    self.line(&format!("key: {}", map_key(key, k)));
                    self.elem("value", elem, item)?;
                    self.close();
                }
                Ok(())
            }
            (FieldKind::Union(union), Value::Union(u)) => self.union(name, union, u),
            (kind, value) => Err(mismatch(Format::Text, name, kind, value)),
        }
    }

    fn elem(&mut self, name: &str, kind: &ElemKind, value: &Value) -> Result<(), IoError> {
        match (kind, value) {
            (ElemKind::Scalar(kind), value) => self.scalar(name, kind, value),
            (ElemKind::Message(desc), Value::Message(msg)) => {
                self.open(name);
                self.message(desc, msg)?;
                self.close();
                Ok(())
            }
            (ElemKind::Message(desc), value) => Err(mismatch(Format::Text, name, &desc.name, value)),
        }
    }

    fn union(&mut self, name: &str, desc: &UnionDescriptor, value: &UnionValue) -> Result<(), IoError> {
        self.open(name);
        match desc.discriminator.by_number(value.discriminator) {
            Some(ev) => self.line(&format!("type: {}", ev.name)),
            None => self.line(&format!("type: {}", value.discriminator)),
        }
        if let Some(variant) = desc.variant(value.discriminator) {
            self.open(&snake_case(&variant.message.name));
            self.message(&variant.message, &value.payload)?;
            self.close();
        }
        self.close();
        Ok(())
    }

    fn seconds_nanos(&mut self, name: &str, (seconds, nanos): (i64, i32)) {
        self.open(name);
        if seconds != 0 {
            self.line(&format!("seconds: {seconds}"));
        }
        if nanos != 0 {
            self.line(&format!("nanos: {nanos}"));
        }
        self.close();
    }

    fn scalar(&mut self, name: &str, kind: &ScalarKind, value: &Value) -> Result<(), IoError> {
        let text = match (kind, value) {
            (ScalarKind::Int32 | ScalarKind::Int64, Value::Int(v)) => v.to_string(),
            (ScalarKind::Uint32 | ScalarKind::Uint64, Value::Uint(v)) => v.to_string(),
            (ScalarKind::Float | ScalarKind::Double, Value::Float(v)) => float(*v),
            (ScalarKind::Bool, Value::Bool(v)) => v.to_string(),
            (ScalarKind::String, Value::String(v)) => quote_str(v),
            (ScalarKind::Bytes, Value::Bytes(v)) => quote_bytes(v),
            (ScalarKind::Enum(desc), Value::Enum(v)) => match desc.by_number(*v) {
                Some(ev) => ev.name.clone(),
                None => v.to_string(),
            },
            (ScalarKind::Timestamp, Value::Timestamp(ts)) => {
                self.seconds_nanos(name, timestamp_parts(ts));
                return Ok(());
            }
            (ScalarKind::Duration, Value::Duration(d)) => {
                self.seconds_nanos(name, duration_parts(d));
                return Ok(());
            }
            (kind, value) => return Err(mismatch(Format::Text, name, kind, value)),
        };
        self.line(&format!("{name}: {text}"));
        Ok(())
    }
}

fn map_key(kind: &ScalarKind, key: &MapKey) -> String {
    match (kind, key) {
        (ScalarKind::String, MapKey::String(s)) => quote_str(s),
        (_, key) => key.to_string(),
    }
}

fn float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v == f64::INFINITY {
        "inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        v.to_string()
    }
}

fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out.push('"');
    out
}
