//! Document encoders.
//!
//! Every encoder walks the document alongside its message descriptor, so
//! scalar widths, enum names and union variants come from the schema rather
//! than from the value tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use tabulon_core::{Document, Message, Value};
use tabulon_spec::FieldDescriptor;

use crate::error::IoError;

pub mod binary;
pub mod json;
pub mod text;

/// Output format of a compiled sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Json,
    Text,
    Binary,
}

impl Format {
    /// File extension written by the CLI.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Text => "txtpb",
            Format::Binary => "binpb",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "json",
            Format::Text => "text",
            Format::Binary => "binary",
        })
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "text" | "txt" | "txtpb" => Ok(Format::Text),
            "binary" | "bin" | "binpb" | "wire" => Ok(Format::Binary),
            other => Err(format!(
                "unknown format `{other}` (expected json, text or binary)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Indent JSON and text output.
    pub pretty: bool,
    /// JSON only: also write fields that hold their zero value or were never
    /// populated.
    pub emit_defaults: bool,
    /// JSON only: keep declared field names instead of lowerCamelCase.
    pub proto_names: bool,
}

pub fn encode(doc: &Document, format: Format, options: &EncodeOptions) -> Result<Vec<u8>, IoError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("encode", sheet = %doc.sheet, %format).entered();

    match format {
        Format::Json => json::encode(doc, options),
        Format::Text => text::encode(doc, options).map(String::into_bytes),
        Format::Binary => binary::encode(doc),
    }
}

/// A field is written when it was populated or holds a non-zero value.
pub(crate) fn is_set(msg: &Message, field: &FieldDescriptor, value: &Value) -> bool {
    msg.has(field.number) || !is_default(value)
}

pub(crate) fn is_default(value: &Value) -> bool {
    match value {
        Value::Bool(v) => !v,
        Value::Int(v) => *v == 0,
        Value::Uint(v) => *v == 0,
        Value::Float(v) => *v == 0.0,
        Value::String(v) => v.is_empty(),
        Value::Bytes(v) => v.is_empty(),
        Value::Enum(v) => *v == 0,
        Value::Timestamp(v) => v.timestamp() == 0 && v.timestamp_subsec_nanos() == 0,
        Value::Duration(v) => v.is_zero(),
        Value::Message(m) => m.is_empty() && m.iter().all(|(_, v)| is_default(v)),
        Value::List(items) => items.is_empty(),
        Value::Map(entries) => entries.is_empty(),
        Value::Union(u) => u.discriminator == 0,
    }
}

/// `item_map` -> `itemMap`.
pub(crate) fn lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for (idx, ch) in name.chars().enumerate() {
        if ch == '_' {
            upper = idx > 0;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// `PvpPayload` -> `pvp_payload`.
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

/// RFC 3339 in UTC with a `Z` suffix.
pub(crate) fn timestamp_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Seconds with up to nine fractional digits: `1.5s`, `-3s`.
pub(crate) fn duration_string(d: &TimeDelta) -> String {
    let negative = *d < TimeDelta::zero();
    let abs = d.abs();
    let secs = abs.num_seconds();
    let nanos = abs.subsec_nanos();
    let sign = if negative { "-" } else { "" };
    if nanos == 0 {
        return format!("{sign}{secs}s");
    }
    let frac = format!("{nanos:09}");
    format!("{sign}{secs}.{}s", frac.trim_end_matches('0'))
}

/// Seconds and nanoseconds of a timestamp, as written by the text and wire
/// encoders.
pub(crate) fn timestamp_parts(ts: &DateTime<Utc>) -> (i64, i32) {
    (ts.timestamp(), ts.timestamp_subsec_nanos() as i32)
}

pub(crate) fn duration_parts(d: &TimeDelta) -> (i64, i32) {
    (d.num_seconds(), d.subsec_nanos())
}

pub(crate) fn mismatch(format: Format, field: &str, expected: impl fmt::Display, value: &Value) -> IoError {
    IoError::Encode {
        format: format.to_string(),
        message: format!("field `{field}` expects {expected}, found `{value}`"),
    }
}
