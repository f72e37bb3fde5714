//! Cell text to typed scalar conversion.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc,
};
use tabulon_spec::{ElemKind, ScalarKind, parse_utc_offset_seconds};

use crate::error::ErrorKind;
use crate::value::{MapKey, Message, Value};

/// Time zone applied to date-times written without an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    offset: FixedOffset,
}

impl Default for Locale {
    fn default() -> Self {
        Self::utc()
    }
}

impl Locale {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// `UTC`, `Z` or a fixed offset such as `+08:00`.
    pub fn from_timezone(tz: &str) -> Option<Self> {
        let seconds = parse_utc_offset_seconds(tz)?;
        FixedOffset::east_opt(seconds).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse one cell into a value of `kind`. Blank text yields the kind's
/// default value with `present = false`.
pub fn parse_scalar(
    kind: &ScalarKind,
    raw: &str,
    locale: &Locale,
) -> Result<(Value, bool), ErrorKind> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok((default_value(kind), false));
    }
    let invalid = |reason: &str| ErrorKind::invalid(kind, text, reason);
    let value = match kind {
        ScalarKind::Int32 => {
            let v = parse_i64(text).map_err(|r| invalid(r))?;
            i32::try_from(v).map_err(|_| invalid("does not fit in int32"))?;
            Value::Int(v)
        }
        ScalarKind::Int64 => Value::Int(parse_i64(text).map_err(|r| invalid(r))?),
        ScalarKind::Uint32 => {
            let v = parse_u64(text).map_err(|r| invalid(r))?;
            u32::try_from(v).map_err(|_| invalid("does not fit in uint32"))?;
            Value::Uint(v)
        }
        ScalarKind::Uint64 => Value::Uint(parse_u64(text).map_err(|r| invalid(r))?),
        ScalarKind::Float => {
            let v: f64 = text.parse().map_err(|_| invalid("not a number"))?;
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(invalid("does not fit in float"));
            }
            Value::Float(v)
        }
        ScalarKind::Double => Value::Float(text.parse().map_err(|_| invalid("not a number"))?),
        ScalarKind::Bool => Value::Bool(parse_bool(text).ok_or_else(|| invalid("not a bool"))?),
        ScalarKind::String => Value::String(text.to_string()),
        ScalarKind::Bytes => Value::Bytes(text.as_bytes().to_vec()),
        ScalarKind::Enum(desc) => {
            let value = desc
                .lookup(text)
                .ok_or_else(|| invalid("not a value name, alias or number of the enum"))?;
            Value::Enum(value.number)
        }
        ScalarKind::Timestamp => {
            Value::Timestamp(parse_timestamp(text, locale).map_err(|r| invalid(r))?)
        }
        ScalarKind::Duration => {
            Value::Duration(parse_duration(text).map_err(|r| invalid(r.as_str()))?)
        }
    };
    Ok((value, true))
}

/// Parse a map key. Only integer, bool, string and enum kinds can key a map.
pub fn parse_map_key(
    kind: &ScalarKind,
    raw: &str,
    locale: &Locale,
) -> Result<(MapKey, bool), ErrorKind> {
    let (value, present) = parse_scalar(kind, raw, locale)?;
    let key = value
        .to_map_key()
        .ok_or_else(|| ErrorKind::unsupported(format!("`{kind}` cannot be used as a map key")))?;
    Ok((key, present))
}

/// Zero value of a scalar kind.
pub fn default_value(kind: &ScalarKind) -> Value {
    match kind {
        ScalarKind::Int32 | ScalarKind::Int64 => Value::Int(0),
        ScalarKind::Uint32 | ScalarKind::Uint64 => Value::Uint(0),
        ScalarKind::Float | ScalarKind::Double => Value::Float(0.0),
        ScalarKind::Bool => Value::Bool(false),
        ScalarKind::String => Value::String(String::new()),
        ScalarKind::Bytes => Value::Bytes(Vec::new()),
        ScalarKind::Enum(_) => Value::Enum(0),
        ScalarKind::Timestamp => Value::Timestamp(DateTime::<Utc>::default()),
        ScalarKind::Duration => Value::Duration(TimeDelta::zero()),
    }
}

/// Zero value of a list element or map value.
pub fn default_elem(kind: &ElemKind) -> Value {
    match kind {
        ElemKind::Scalar(kind) => default_value(kind),
        ElemKind::Message(_) => Value::Message(Message::new()),
    }
}

/// 2^63 and 2^64, the first integral floats past `i64` and `u64`.
const I64_END: f64 = 9_223_372_036_854_775_808.0;
const U64_END: f64 = 18_446_744_073_709_551_616.0;

fn parse_i64(text: &str) -> Result<i64, &'static str> {
    if let Ok(v) = text.parse::<i64>() {
        return Ok(v);
    }
    // Spreadsheets often store integers as `3.0`.
    let f: f64 = text.parse().map_err(|_| "not an integer")?;
    // `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < I64_END {
        Ok(f as i64)
    } else {
        Err("not an integer")
    }
}

fn parse_u64(text: &str) -> Result<u64, &'static str> {
    if let Ok(v) = text.parse::<u64>() {
        return Ok(v);
    }
    let f: f64 = text.parse().map_err(|_| "not an unsigned integer")?;
    if f.fract() == 0.0 && f >= 0.0 && f < U64_END {
        Ok(f as u64)
    } else {
        Err("not an unsigned integer")
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(text: &str, locale: &Locale) -> Result<DateTime<Utc>, &'static str> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or("expected RFC 3339 or `YYYY-MM-DD[ HH:MM:SS]`")?;
    locale
        .offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or("ambiguous local time")
}

/// `1h30m`, `90s`, `1.5h`, `250ms`, `-2m`.
fn parse_duration(text: &str) -> Result<TimeDelta, String> {
    let (negative, mut rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut nanos = 0f64;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_end == 0 {
            return Err(format!("expected a number before `{rest}`"));
        }
        let number: f64 = rest[..num_end]
            .parse()
            .map_err(|_| format!("bad number `{}`", &rest[..num_end]))?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err("missing unit (ns, us, ms, s, m, h)".to_string()),
            other => return Err(format!("unknown unit `{other}`")),
        };
        nanos += number * scale;
        rest = &rest[unit_end..];
    }

    let nanos = nanos.round();
    if nanos > i64::MAX as f64 {
        return Err("duration overflows".to_string());
    }
    let delta = TimeDelta::nanoseconds(nanos as i64);
    Ok(if negative { -delta } else { delta })
}
