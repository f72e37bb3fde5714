//! Effective per-field parsing parameters.
//!
//! Resolution is a pure function of the field descriptor and the sheet
//! defaults; nothing is cached between calls.

use std::fmt;

use tabulon_spec::{
    ElemKind, FieldDescriptor, FieldKind, Layout, MessageDescriptor, SheetDescriptor, Span,
};

/// Sheet-level values that field annotations fall back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDefaults {
    pub sep: String,
    pub subsep: String,
    pub optional: bool,
}

impl Default for SheetDefaults {
    fn default() -> Self {
        Self {
            sep: tabulon_spec::DEFAULT_SEP.to_string(),
            subsep: tabulon_spec::DEFAULT_SUBSEP.to_string(),
            optional: false,
        }
    }
}

impl From<&SheetDescriptor> for SheetDefaults {
    fn from(sheet: &SheetDescriptor) -> Self {
        Self {
            sep: sheet.sep.clone(),
            subsep: sheet.subsep.clone(),
            optional: sheet.optional,
        }
    }
}

/// Validation properties with defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prop {
    pub unique: Option<bool>,
    /// Raw `"lo,hi"` range, interpreted with the value's kind when checked.
    pub range: Option<String>,
    pub sequence: Option<i64>,
    pub fixed: bool,
    pub size: Option<usize>,
    /// Raw `Sheet(Alias).Column` reference.
    pub refer: Option<String>,
    pub present: bool,
    pub default: Option<String>,
    /// Consecutive union payload cells taken by the field (at least 1).
    pub cells: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOptions {
    /// Column name, or column prefix for nested values.
    pub name: String,
    /// Key column suffix for maps and keyed lists.
    pub key: String,
    /// `key` was annotated explicitly. Lists are keyed only then.
    pub keyed: bool,
    pub layout: Layout,
    pub span: Span,
    pub sep: String,
    pub subsep: String,
    pub optional: bool,
    pub prop: Prop,
}

pub const DEFAULT_KEY: &str = "Key";

impl FieldOptions {
    pub fn resolve(field: &FieldDescriptor, defaults: &SheetDefaults) -> Self {
        let ann = &field.annotation;
        let prop = ann.prop.clone().unwrap_or_default();
        Self {
            name: ann
                .name
                .clone()
                .unwrap_or_else(|| default_name(&field.name, field.kind.is_collection())),
            key: ann.key.clone().unwrap_or_else(|| DEFAULT_KEY.to_string()),
            keyed: ann.key.is_some(),
            layout: resolved_layout(field),
            span: ann.span.unwrap_or_default(),
            sep: ann.sep.clone().unwrap_or_else(|| defaults.sep.clone()),
            subsep: ann.subsep.clone().unwrap_or_else(|| defaults.subsep.clone()),
            optional: ann.optional.unwrap_or(false) || defaults.optional,
            prop: Prop {
                unique: prop.unique,
                range: prop.range,
                sequence: prop.sequence,
                fixed: prop.fixed,
                size: prop.size.map(|n| n as usize),
                refer: prop.refer,
                present: prop.present,
                default: prop.default,
                cells: prop.cells.map_or(1, |n| n.max(1) as usize),
            },
        }
    }
}

impl fmt::Display for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name={}", self.name)?;
        if self.layout != Layout::Default {
            write!(f, " layout={}", self.layout)?;
        }
        if self.span != Span::Default {
            write!(f, " span={}", self.span)?;
        }
        if self.keyed || self.layout != Layout::Default {
            write!(f, " key={}", self.key)?;
        }
        if self.optional {
            f.write_str(" optional")?;
        }
        Ok(())
    }
}

/// Layout after defaults: maps are vertical, lists horizontal, and any
/// collection spanning one cell is in-cell. Non-collections have none.
pub fn resolved_layout(field: &FieldDescriptor) -> Layout {
    if !field.kind.is_collection() {
        return Layout::Default;
    }
    let ann = &field.annotation;
    match ann.layout {
        Some(layout) if layout != Layout::Default => layout,
        _ if ann.span == Some(Span::InnerCell) => Layout::Incell,
        _ => match field.kind {
            FieldKind::Map { .. } => Layout::Vertical,
            _ => Layout::Horizontal,
        },
    }
}

/// The message declares a collection laid out one element per row.
pub fn has_vertical_collection(desc: &MessageDescriptor) -> bool {
    desc.fields
        .iter()
        .any(|f| f.kind.is_collection() && resolved_layout(f) == Layout::Vertical)
}

/// Element message of a list or map value, if any.
pub fn elem_message(kind: &FieldKind) -> Option<&MessageDescriptor> {
    match kind {
        FieldKind::List(ElemKind::Message(m))
        | FieldKind::Map {
            value: ElemKind::Message(m),
            ..
        } => Some(m.as_ref()),
        _ => None,
    }
}

/// PascalCase of a snake_case field name. Collections drop a trailing
/// `List`/`Map`: `item_map` -> `Item`.
pub fn default_name(field: &str, collection: bool) -> String {
    let pascal: String = field
        .split('_')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    if collection {
        for suffix in ["List", "Map"] {
            if let Some(stem) = pascal.strip_suffix(suffix) {
                if !stem.is_empty() {
                    return stem.to_string();
                }
            }
        }
    }
    pascal
}
