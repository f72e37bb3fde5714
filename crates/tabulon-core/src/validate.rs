//! Checks invoked by the builder: key uniqueness, value ranges, key
//! sequences, gap detection and fixed-size padding.

use tabulon_spec::{ElemKind, Layout, MessageDescriptor, RangeSpec, ScalarKind};

use crate::codec::default_elem;
use crate::error::ErrorKind;
use crate::options::{FieldOptions, has_vertical_collection};
use crate::value::{MapKey, Value};

/// Whether keys of a map or keyed list must be unique.
///
/// An explicit `unique` wins. Otherwise a vertical collection whose elements
/// contain another vertical collection may repeat keys (later rows add to
/// the same element); everything else must be unique.
pub fn must_be_unique(opts: &FieldOptions, elem: Option<&MessageDescriptor>) -> bool {
    if let Some(unique) = opts.prop.unique {
        return unique;
    }
    match opts.layout {
        Layout::Vertical => !elem.is_some_and(has_vertical_collection),
        _ => true,
    }
}

/// Whether `value` lies inside the raw `"lo,hi"` range. Malformed bounds and
/// kinds that cannot be ranged count as out of range.
pub fn in_range(kind: &ScalarKind, value: &Value, range: &str) -> bool {
    let spec: RangeSpec = match range.parse() {
        Ok(spec) => spec,
        Err(_reason) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(range, reason = %_reason, "malformed range");
            return false;
        }
    };
    match compare_bounds(kind, value, &spec) {
        Some(inside) => inside,
        None => {
            #[cfg(feature = "tracing")]
            tracing::warn!(range, kind = %kind, value = %value, "range does not apply to value");
            false
        }
    }
}

/// `None` when a bound does not parse as the value's kind.
fn compare_bounds(kind: &ScalarKind, value: &Value, spec: &RangeSpec) -> Option<bool> {
    fn check<T: PartialOrd>(
        v: T,
        lo: Option<&str>,
        hi: Option<&str>,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<bool> {
        let lo = lo.map(&parse).map_or(Some(None), |b| b.map(Some))?;
        let hi = hi.map(&parse).map_or(Some(None), |b| b.map(Some))?;
        Some(lo.is_none_or(|lo| v >= lo) && hi.is_none_or(|hi| v <= hi))
    }
    let (lo, hi) = (spec.lo.as_deref(), spec.hi.as_deref());
    match (kind, value) {
        (_, Value::Int(v)) if kind.is_integer() => check(*v, lo, hi, |s| s.parse().ok()),
        (_, Value::Uint(v)) if kind.is_integer() => check(*v, lo, hi, |s| s.parse().ok()),
        (ScalarKind::Float | ScalarKind::Double, Value::Float(v)) => {
            check(*v, lo, hi, |s| s.parse().ok())
        }
        (ScalarKind::Enum(desc), Value::Enum(v)) => {
            check(*v, lo, hi, |s| desc.lookup(s).map(|e| e.number))
        }
        _ => None,
    }
}

pub fn check_range(kind: &ScalarKind, value: &Value, range: &str) -> Result<(), ErrorKind> {
    if in_range(kind, value, range) {
        Ok(())
    } else {
        Err(ErrorKind::ValueOutOfRange {
            value: value.to_string(),
            range: range.to_string(),
        })
    }
}

/// A new key must equal `start` when nothing was inserted yet, otherwise
/// the largest existing key plus one.
pub fn check_sequence(
    start: i64,
    existing_max: Option<i64>,
    key: &MapKey,
) -> Result<(), ErrorKind> {
    let expected = match existing_max {
        None => start,
        Some(max) => max.saturating_add(1),
    };
    match key.as_i64() {
        Some(k) if k == expected => Ok(()),
        Some(_) => Err(ErrorKind::KeyNotSequent {
            key: key.to_string(),
            expected,
        }),
        None => Err(ErrorKind::unsupported(format!(
            "sequence needs integer keys, got `{key}`"
        ))),
    }
}

/// Tracks the first empty element of a repeated group and rejects any
/// populated element after it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Continuity {
    first_absent: Option<usize>,
}

impl Continuity {
    /// `index` is 1-based.
    pub fn observe(&mut self, index: usize, present: bool) -> Result<(), ErrorKind> {
        match (present, self.first_absent) {
            (true, Some(missing)) => Err(ErrorKind::NonContiguous {
                missing,
                present: index,
            }),
            (false, None) => {
                self.first_absent = Some(index);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Grow `list` with default elements up to `size`. Never truncates.
pub fn pad_list(list: &mut Vec<Value>, size: usize, elem: &ElemKind) {
    while list.len() < size {
        list.push(default_elem(elem));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabulon_spec::{EnumDescriptor, EnumValue};

    use super::*;

    #[test]
    fn ranges_are_inclusive_and_open_ended() {
        let int = ScalarKind::Int32;
        assert!(in_range(&int, &Value::Int(1), "1,10"));
        assert!(in_range(&int, &Value::Int(10), "1,10"));
        assert!(!in_range(&int, &Value::Int(11), "1,10"));
        assert!(in_range(&int, &Value::Int(1_000_000), "1,~"));
        assert!(in_range(&int, &Value::Int(-5), "~,0"));
        assert!(in_range(&ScalarKind::Double, &Value::Float(0.5), "0,1.5"));
        assert!(in_range(&ScalarKind::Uint32, &Value::Uint(3), "1,3"));
    }

    #[test]
    fn ranges_fail_closed() {
        let int = ScalarKind::Int32;
        assert!(!in_range(&int, &Value::Int(1), "a,10"));
        assert!(!in_range(&int, &Value::Int(1), "1"));
        assert!(!in_range(&ScalarKind::String, &Value::String("x".into()), "1,2"));
        assert!(!in_range(&ScalarKind::Uint32, &Value::Uint(1), "-1,5"));
        assert!(matches!(
            check_range(&int, &Value::Int(0), "1,~"),
            Err(ErrorKind::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn enum_ranges_use_value_numbers() {
        let kind = ScalarKind::Enum(Arc::new(EnumDescriptor {
            name: "Grade".into(),
            values: (0..4)
                .map(|n| EnumValue {
                    name: format!("GRADE_{n}"),
                    number: n,
                    alias: None,
                })
                .collect(),
        }));
        assert!(in_range(&kind, &Value::Enum(2), "GRADE_1,GRADE_2"));
        assert!(!in_range(&kind, &Value::Enum(3), "GRADE_1,2"));
    }

    #[test]
    fn sequences() {
        assert!(check_sequence(1, None, &MapKey::Uint(1)).is_ok());
        assert!(check_sequence(1, Some(1), &MapKey::Uint(2)).is_ok());
        assert_eq!(
            check_sequence(1, Some(2), &MapKey::Uint(5)),
            Err(ErrorKind::KeyNotSequent {
                key: "5".into(),
                expected: 3
            })
        );
        assert!(check_sequence(1, None, &MapKey::Int(0)).is_err());
    }

    #[test]
    fn continuity_rejects_gaps() {
        let mut c = Continuity::default();
        c.observe(1, true).unwrap();
        c.observe(2, false).unwrap();
        c.observe(3, false).unwrap();
        assert_eq!(
            c.observe(4, true),
            Err(ErrorKind::NonContiguous {
                missing: 2,
                present: 4
            })
        );
    }

    #[test]
    fn padding_never_truncates() {
        let elem = ElemKind::Scalar(ScalarKind::Int32);
        let mut list = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        pad_list(&mut list, 5, &elem);
        assert_eq!(list.len(), 5);
        assert_eq!(list[4], Value::Int(0));
        pad_list(&mut list, 2, &elem);
        assert_eq!(list.len(), 5);
    }
}
