//! Field type expressions: `int32`, `Item`, `[Item]`, `map<uint32, Item>`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex must compile"));

/// Scalar type names understood without a declaration.
pub const SCALAR_TYPES: &[&str] = &[
    "int32",
    "int64",
    "uint32",
    "uint64",
    "float",
    "double",
    "bool",
    "string",
    "bytes",
    "timestamp",
    "duration",
];

/// Scalar names allowed as map keys.
pub const MAP_KEY_TYPES: &[&str] = &["int32", "int64", "uint32", "uint64", "bool", "string"];

/// Parsed shape of a field's `type` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Single(String),
    List(String),
    Map { key: String, value: String },
}

impl TypeExpr {
    /// Every type name referenced by the expression.
    pub fn names(&self) -> Vec<&str> {
        match self {
            TypeExpr::Single(name) | TypeExpr::List(name) => vec![name.as_str()],
            TypeExpr::Map { key, value } => vec![key.as_str(), value.as_str()],
        }
    }
}

pub fn is_scalar_type(name: &str) -> bool {
    SCALAR_TYPES.contains(&name)
}

fn ident(s: &str, whole: &str) -> Result<String, String> {
    let s = s.trim();
    if IDENT.is_match(s) {
        Ok(s.to_string())
    } else {
        Err(format!("`{s}` is not a valid type name in `{whole}`"))
    }
}

impl FromStr for TypeExpr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if let Some(inner) = text
            .strip_prefix("map<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            let Some((key, value)) = inner.split_once(',') else {
                return Err(format!("map type `{text}` must be `map<K, V>`"));
            };
            return Ok(TypeExpr::Map {
                key: ident(key, text)?,
                value: ident(value, text)?,
            });
        }
        if let Some(inner) = text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            return Ok(TypeExpr::List(ident(inner, text)?));
        }
        Ok(TypeExpr::Single(ident(text, text)?))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Single(name) => f.write_str(name),
            TypeExpr::List(name) => write!(f, "[{name}]"),
            TypeExpr::Map { key, value } => write!(f, "map<{key}, {value}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_shapes() {
        assert_eq!(
            "uint32".parse::<TypeExpr>().unwrap(),
            TypeExpr::Single("uint32".into())
        );
        assert_eq!(
            " [Item] ".parse::<TypeExpr>().unwrap(),
            TypeExpr::List("Item".into())
        );
        assert_eq!(
            "map<uint32, Item>".parse::<TypeExpr>().unwrap(),
            TypeExpr::Map {
                key: "uint32".into(),
                value: "Item".into()
            }
        );
    }

    #[test]
    fn rejects_nested_and_malformed() {
        assert!("[[Item]]".parse::<TypeExpr>().is_err());
        assert!("map<uint32>".parse::<TypeExpr>().is_err());
        assert!("map<uint32, [Item]>".parse::<TypeExpr>().is_err());
        assert!("1Item".parse::<TypeExpr>().is_err());
        assert!("".parse::<TypeExpr>().is_err());
    }

    #[test]
    fn display_roundtrips() {
        for text in ["int64", "[Reward]", "map<string, Shop>"] {
            assert_eq!(text.parse::<TypeExpr>().unwrap().to_string(), text);
        }
    }
}
