//! Per-field annotations: the raw payload that tells the compiler where a
//! field lives in a sheet and how its cells are validated.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Spatial convention used to encode a repeated or nested value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Let the compiler pick from the field kind.
    #[default]
    Default,
    /// One element per row.
    Vertical,
    /// One element per numbered column group (`Item1ID`, `Item2ID`, ...).
    Horizontal,
    /// All elements packed in one cell.
    Incell,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layout::Default => "default",
            Layout::Vertical => "vertical",
            Layout::Horizontal => "horizontal",
            Layout::Incell => "incell",
        })
    }
}

/// Whether a value occupies one cell or several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Span {
    #[default]
    Default,
    /// The whole value is packed in a single cell.
    InnerCell,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Span::Default => "default",
            Span::InnerCell => "inner_cell",
        })
    }
}

/// Field annotation as written in the manifest. Every member is optional;
/// absent members fall back to name conventions and sheet/book defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldAnnotation {
    /// Column name (or column prefix for nested values).
    #[serde(default)]
    pub name: Option<String>,
    /// Key column suffix for maps and keyed lists.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub layout: Option<Layout>,
    #[serde(default)]
    pub span: Option<Span>,
    /// Element separator for in-cell values.
    #[serde(default)]
    pub sep: Option<String>,
    /// Secondary separator (map key/value, struct fields inside list elements).
    #[serde(default)]
    pub subsep: Option<String>,
    /// Missing columns read as empty instead of failing.
    #[serde(default)]
    pub optional: Option<bool>,
    #[serde(default)]
    pub prop: Option<FieldProp>,
}

/// Validation properties attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldProp {
    /// Explicit key uniqueness. `None` lets the compiler deduce it.
    #[serde(default)]
    pub unique: Option<bool>,
    /// Inclusive value range `"lo,hi"`; `~` leaves a side unbounded.
    #[serde(default)]
    pub range: Option<String>,
    /// Map keys must start at this value and increase by one.
    #[serde(default)]
    pub sequence: Option<i64>,
    /// Pad the collection to the number of columns found in the header.
    #[serde(default)]
    pub fixed: bool,
    /// Pad the collection to exactly this many elements.
    #[serde(default)]
    pub size: Option<u32>,
    /// Values must exist in another sheet's column: `Sheet(Alias).Column`.
    #[serde(default)]
    pub refer: Option<String>,
    /// The cell must not be empty.
    #[serde(default)]
    pub present: bool,
    /// Text used in place of an empty cell.
    #[serde(default)]
    pub default: Option<String>,
    /// Number of consecutive cells taken by a union payload field.
    #[serde(default)]
    pub cells: Option<u32>,
}

/// Parsed form of a `"lo,hi"` range property. Bounds stay textual so they
/// can be interpreted with the field's own numeric kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeSpec {
    pub lo: Option<String>,
    pub hi: Option<String>,
}

impl FromStr for RangeSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(format!(
                "range `{s}` must have the form \"lo,hi\" (use `~` for an open side)"
            ));
        }
        let bound = |part: &str| -> Result<Option<String>, String> {
            match part {
                "~" => Ok(None),
                "" => Err(format!("range `{s}` has an empty bound")),
                other => Ok(Some(other.to_string())),
            }
        };
        Ok(Self {
            lo: bound(parts[0])?,
            hi: bound(parts[1])?,
        })
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}",
            self.lo.as_deref().unwrap_or("~"),
            self.hi.as_deref().unwrap_or("~")
        )
    }
}

/// Cross-sheet reference `Sheet(Alias).Column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// The raw specifier, used as the cache key.
    pub raw: String,
    pub sheet: String,
    /// Message name whose sheet options describe the referenced sheet.
    pub alias: Option<String>,
    pub column: String,
}

impl FromStr for Reference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let Some((head, column)) = raw.rsplit_once('.') else {
            return Err(format!("reference `{raw}` must have the form Sheet(Alias).Column"));
        };
        let column = column.trim();
        if column.is_empty() {
            return Err(format!("reference `{raw}` names no column"));
        }
        let (sheet, alias) = match head.find('(') {
            Some(open) => {
                let Some(inner) = head[open + 1..].strip_suffix(')') else {
                    return Err(format!("reference `{raw}` has an unclosed alias"));
                };
                let inner = inner.trim();
                (
                    head[..open].trim(),
                    (!inner.is_empty()).then(|| inner.to_string()),
                )
            }
            None => (head.trim(), None),
        };
        if sheet.is_empty() {
            return Err(format!("reference `{raw}` names no sheet"));
        }
        Ok(Self {
            raw: raw.to_string(),
            sheet: sheet.to_string(),
            alias,
            column: column.to_string(),
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parses_open_sides() {
        let range: RangeSpec = "1,~".parse().unwrap();
        assert_eq!(range.lo.as_deref(), Some("1"));
        assert_eq!(range.hi, None);
        assert_eq!(range.to_string(), "1,~");

        let range: RangeSpec = " ~ , 10 ".parse().unwrap();
        assert_eq!(range.lo, None);
        assert_eq!(range.hi.as_deref(), Some("10"));
    }

    #[test]
    fn range_rejects_bad_shape() {
        assert!("1".parse::<RangeSpec>().is_err());
        assert!("1,2,3".parse::<RangeSpec>().is_err());
        assert!("1,".parse::<RangeSpec>().is_err());
    }

    #[test]
    fn reference_with_alias() {
        let refer: Reference = "Item(ItemConf).ID".parse().unwrap();
        assert_eq!(refer.sheet, "Item");
        assert_eq!(refer.alias.as_deref(), Some("ItemConf"));
        assert_eq!(refer.column, "ID");
        assert_eq!(refer.raw, "Item(ItemConf).ID");
    }

    #[test]
    fn reference_without_alias() {
        let refer: Reference = "Item.ID".parse().unwrap();
        assert_eq!(refer.sheet, "Item");
        assert_eq!(refer.alias, None);
        assert_eq!(refer.column, "ID");
    }

    #[test]
    fn reference_rejects_malformed() {
        assert!("ItemID".parse::<Reference>().is_err());
        assert!("Item(Conf.ID".parse::<Reference>().is_err());
        assert!(".ID".parse::<Reference>().is_err());
        assert!("Item.".parse::<Reference>().is_err());
    }
}
