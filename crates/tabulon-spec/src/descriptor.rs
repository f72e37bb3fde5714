//! Resolved schema object model.
//!
//! A [`Manifest`] names types by string; resolution links those names into an
//! immutable tree of descriptors that the compiler walks with plain pattern
//! matching over [`FieldKind`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::annotation::FieldAnnotation;
use crate::manifest::{
    BookOptions, EnumDecl, Manifest, MessageDecl, SheetDecl, UnionDecl, DEFAULT_DATAROW,
    DEFAULT_NAMEROW, DEFAULT_NOTEROW, DEFAULT_SEP, DEFAULT_SUBSEP, DEFAULT_TIMEZONE,
    DEFAULT_TYPEROW,
};
use crate::types::TypeExpr;
use crate::validation::SchemaError;

/// Fully resolved schema.
#[derive(Debug, Clone)]
pub struct Schema {
    pub book: BookDefaults,
    pub enums: BTreeMap<String, Arc<EnumDescriptor>>,
    pub messages: BTreeMap<String, Arc<MessageDescriptor>>,
    pub unions: BTreeMap<String, Arc<UnionDescriptor>>,
    pub sheets: Vec<Arc<SheetDescriptor>>,
}

impl Schema {
    /// Sheet descriptor by worksheet name.
    pub fn sheet(&self, name: &str) -> Option<&Arc<SheetDescriptor>> {
        self.sheets.iter().find(|s| s.sheet == name)
    }

    /// Sheet descriptor by the name of the message it builds.
    pub fn sheet_for_message(&self, message: &str) -> Option<&Arc<SheetDescriptor>> {
        self.sheets.iter().find(|s| s.message.name == message)
    }

    pub fn message(&self, name: &str) -> Option<&Arc<MessageDescriptor>> {
        self.messages.get(name)
    }
}

/// Book-level defaults inherited by every sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDefaults {
    pub name: Option<String>,
    pub sep: String,
    pub subsep: String,
    pub timezone: String,
    pub header: HeaderLayout,
}

impl Default for BookDefaults {
    fn default() -> Self {
        Self {
            name: None,
            sep: DEFAULT_SEP.to_string(),
            subsep: DEFAULT_SUBSEP.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            header: HeaderLayout::default(),
        }
    }
}

/// Where the header rows of a sheet live. Rows are 1-based; a line of `0`
/// means "the whole cell", otherwise the Nth physical line inside the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderLayout {
    pub namerow: u32,
    pub typerow: Option<u32>,
    pub noterow: Option<u32>,
    pub datarow: u32,
    pub nameline: u32,
    pub typeline: u32,
}

impl Default for HeaderLayout {
    fn default() -> Self {
        Self {
            namerow: DEFAULT_NAMEROW,
            typerow: Some(DEFAULT_TYPEROW),
            noterow: Some(DEFAULT_NOTEROW),
            datarow: DEFAULT_DATAROW,
            nameline: 0,
            typeline: 0,
        }
    }
}

impl HeaderLayout {
    /// Header with only a name row, data starting right below it.
    pub fn names_only(namerow: u32) -> Self {
        Self {
            namerow,
            typerow: None,
            noterow: None,
            datarow: namerow + 1,
            nameline: 0,
            typeline: 0,
        }
    }

    /// Header with a name row and a type row, data right below.
    pub fn names_and_types(namerow: u32, typerow: u32) -> Self {
        Self {
            namerow,
            typerow: Some(typerow),
            noterow: None,
            datarow: namerow.max(typerow) + 1,
            nameline: 0,
            typeline: 0,
        }
    }

    /// Last row occupied by the header.
    pub fn last_header_row(&self) -> u32 {
        self.namerow
            .max(self.typerow.unwrap_or(0))
            .max(self.noterow.unwrap_or(0))
    }
}

/// One worksheet compiled into one message.
#[derive(Debug, Clone)]
pub struct SheetDescriptor {
    pub sheet: String,
    pub message: Arc<MessageDescriptor>,
    pub header: HeaderLayout,
    pub transpose: bool,
    /// Every field of this sheet tolerates missing columns.
    pub optional: bool,
    pub sep: String,
    pub subsep: String,
    pub timezone: String,
    /// Additional sheets parsed into the same message.
    pub merger: Vec<String>,
    /// Sheets built with the same message and merged on top of the result.
    pub patches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    pub kind: FieldKind,
    pub annotation: FieldAnnotation,
}

/// Closed set of field shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Message(Arc<MessageDescriptor>),
    List(ElemKind),
    Map { key: ScalarKind, value: ElemKind },
    Union(Arc<UnionDescriptor>),
}

impl FieldKind {
    pub fn is_collection(&self) -> bool {
        matches!(self, FieldKind::List(_) | FieldKind::Map { .. })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(kind) => write!(f, "{kind}"),
            FieldKind::Message(msg) => f.write_str(&msg.name),
            FieldKind::List(elem) => write!(f, "[{elem}]"),
            FieldKind::Map { key, value } => write!(f, "map<{key}, {value}>"),
            FieldKind::Union(union) => write!(f, "union {}", union.name),
        }
    }
}

/// Element type of lists and map values.
#[derive(Debug, Clone, PartialEq)]
pub enum ElemKind {
    Scalar(ScalarKind),
    Message(Arc<MessageDescriptor>),
}

impl fmt::Display for ElemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElemKind::Scalar(kind) => write!(f, "{kind}"),
            ElemKind::Message(msg) => f.write_str(&msg.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarKind {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
    Timestamp,
    Duration,
    Enum(Arc<EnumDescriptor>),
}

impl ScalarKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int32" => ScalarKind::Int32,
            "int64" => ScalarKind::Int64,
            "uint32" => ScalarKind::Uint32,
            "uint64" => ScalarKind::Uint64,
            "float" => ScalarKind::Float,
            "double" => ScalarKind::Double,
            "bool" => ScalarKind::Bool,
            "string" => ScalarKind::String,
            "bytes" => ScalarKind::Bytes,
            "timestamp" => ScalarKind::Timestamp,
            "duration" => ScalarKind::Duration,
            _ => return None,
        })
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ScalarKind::Int32 | ScalarKind::Int64 | ScalarKind::Uint32 | ScalarKind::Uint64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, ScalarKind::Float | ScalarKind::Double)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
            ScalarKind::Bytes => "bytes",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::Duration => "duration",
            ScalarKind::Enum(desc) => desc.name.as_str(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
    pub alias: Option<String>,
}

impl EnumDescriptor {
    pub fn by_number(&self, number: i32) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.number == number)
    }

    /// Look a value up by number, full name or alias.
    pub fn lookup(&self, text: &str) -> Option<&EnumValue> {
        let text = text.trim();
        if let Ok(number) = text.parse::<i32>() {
            return self.by_number(number);
        }
        self.values
            .iter()
            .find(|v| v.name == text || v.alias.as_deref() == Some(text))
    }
}

/// Tagged union: a discriminator enum selects exactly one payload message.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDescriptor {
    pub name: String,
    pub discriminator: Arc<EnumDescriptor>,
    /// Column suffix of the discriminator cell (default `Type`).
    pub type_field: String,
    /// Column stem of the numbered payload cells (default `Field`).
    pub value_field: String,
    pub variants: Vec<UnionVariant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionVariant {
    /// Discriminator number selecting this variant.
    pub value: i32,
    /// Discriminator value name.
    pub name: String,
    pub message: Arc<MessageDescriptor>,
}

impl UnionDescriptor {
    pub fn variant(&self, value: i32) -> Option<&UnionVariant> {
        self.variants.iter().find(|v| v.value == value)
    }
}

impl Manifest {
    /// Validate and link the manifest into an immutable [`Schema`].
    pub fn resolve(&self) -> Result<Schema, SchemaError> {
        self.validate()?;
        let mut resolver = Resolver::new(self);

        let mut enums = BTreeMap::new();
        for decl in &self.enums {
            enums.insert(decl.name.clone(), resolver.enumeration(&decl.name)?);
        }
        let mut messages = BTreeMap::new();
        for decl in &self.messages {
            messages.insert(decl.name.clone(), resolver.message(&decl.name)?);
        }
        let mut unions = BTreeMap::new();
        for decl in &self.unions {
            unions.insert(decl.name.clone(), resolver.union(&decl.name)?);
        }

        let book = book_defaults(&self.book);
        let mut sheets = Vec::with_capacity(self.sheets.len());
        for decl in &self.sheets {
            let message = resolver.message(&decl.message)?;
            sheets.push(Arc::new(sheet_descriptor(decl, &book, message)));
        }

        Ok(Schema {
            book,
            enums,
            messages,
            unions,
            sheets,
        })
    }
}

fn book_defaults(book: &BookOptions) -> BookDefaults {
    let header = header_layout(
        None,
        book.namerow,
        book.typerow,
        book.noterow,
        book.datarow,
        book.nameline,
        book.typeline,
    );
    BookDefaults {
        name: book.name.clone(),
        sep: book.sep.clone().unwrap_or_else(|| DEFAULT_SEP.to_string()),
        subsep: book
            .subsep
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBSEP.to_string()),
        timezone: book
            .timezone
            .clone()
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        header,
    }
}

fn sheet_descriptor(
    decl: &SheetDecl,
    book: &BookDefaults,
    message: Arc<MessageDescriptor>,
) -> SheetDescriptor {
    let header = header_layout(
        Some(&book.header),
        decl.namerow,
        decl.typerow,
        decl.noterow,
        decl.datarow,
        decl.nameline,
        decl.typeline,
    );
    SheetDescriptor {
        sheet: decl.sheet_name().to_string(),
        message,
        header,
        transpose: decl.transpose,
        optional: decl.optional,
        sep: decl.sep.clone().unwrap_or_else(|| book.sep.clone()),
        subsep: decl.subsep.clone().unwrap_or_else(|| book.subsep.clone()),
        timezone: book.timezone.clone(),
        merger: decl.merger.clone(),
        patches: decl.patches.clone(),
    }
}

/// Merge explicit header rows over inherited ones. A `typerow`/`noterow` of
/// `0` disables that row; a missing `datarow` starts right below the header.
pub(crate) fn header_layout(
    base: Option<&HeaderLayout>,
    namerow: Option<u32>,
    typerow: Option<u32>,
    noterow: Option<u32>,
    datarow: Option<u32>,
    nameline: Option<u32>,
    typeline: Option<u32>,
) -> HeaderLayout {
    let inherited = base.copied().unwrap_or_default();
    let nonzero = |row: u32| (row != 0).then_some(row);
    let mut layout = HeaderLayout {
        namerow: namerow.unwrap_or(inherited.namerow),
        typerow: typerow.map_or(inherited.typerow, nonzero),
        noterow: noterow.map_or(inherited.noterow, nonzero),
        datarow: 0,
        nameline: nameline.unwrap_or(inherited.nameline),
        typeline: typeline.unwrap_or(inherited.typeline),
    };
    let any_row_given = namerow.is_some() || typerow.is_some() || noterow.is_some();
    layout.datarow = match datarow {
        Some(row) => row,
        None if any_row_given => layout.last_header_row() + 1,
        None => inherited.datarow.max(layout.last_header_row() + 1),
    };
    layout
}

struct Resolver<'a> {
    enum_decls: BTreeMap<&'a str, &'a EnumDecl>,
    message_decls: BTreeMap<&'a str, &'a MessageDecl>,
    union_decls: BTreeMap<&'a str, &'a UnionDecl>,
    enums: BTreeMap<String, Arc<EnumDescriptor>>,
    messages: BTreeMap<String, Arc<MessageDescriptor>>,
    unions: BTreeMap<String, Arc<UnionDescriptor>>,
    in_progress: HashSet<String>,
}

impl<'a> Resolver<'a> {
    fn new(manifest: &'a Manifest) -> Self {
        Self {
            enum_decls: manifest.enums.iter().map(|d| (d.name.as_str(), d)).collect(),
            message_decls: manifest
                .messages
                .iter()
                .map(|d| (d.name.as_str(), d))
                .collect(),
            union_decls: manifest.unions.iter().map(|d| (d.name.as_str(), d)).collect(),
            enums: BTreeMap::new(),
            messages: BTreeMap::new(),
            unions: BTreeMap::new(),
            in_progress: HashSet::new(),
        }
    }

    fn enumeration(&mut self, name: &str) -> Result<Arc<EnumDescriptor>, SchemaError> {
        if let Some(done) = self.enums.get(name) {
            return Ok(done.clone());
        }
        let decl = self
            .enum_decls
            .get(name)
            .ok_or_else(|| unresolved("enums", name))?;
        let desc = Arc::new(EnumDescriptor {
            name: decl.name.clone(),
            values: decl
                .values
                .iter()
                .map(|v| EnumValue {
                    name: v.name.clone(),
                    number: v.number,
                    alias: v.alias.clone(),
                })
                .collect(),
        });
        self.enums.insert(name.to_string(), desc.clone());
        Ok(desc)
    }

    fn message(&mut self, name: &str) -> Result<Arc<MessageDescriptor>, SchemaError> {
        if let Some(done) = self.messages.get(name) {
            return Ok(done.clone());
        }
        let decl = *self
            .message_decls
            .get(name)
            .ok_or_else(|| unresolved("messages", name))?;
        if !self.in_progress.insert(name.to_string()) {
            return Err(SchemaError::Resolve {
                path: format!("messages.{name}"),
                message: "message contains itself".to_string(),
            });
        }

        let mut fields = Vec::with_capacity(decl.fields.len());
        for (idx, field) in decl.fields.iter().enumerate() {
            let path = format!("messages.{name}.fields[{idx}]");
            let expr: TypeExpr = field
                .type_expr
                .parse()
                .map_err(|message| SchemaError::Resolve {
                    path: path.clone(),
                    message,
                })?;
            let kind = self.field_kind(&expr, &path)?;
            fields.push(FieldDescriptor {
                name: field.name.clone(),
                number: field.number.unwrap_or(idx as u32 + 1),
                kind,
                annotation: field.options.clone().unwrap_or_default(),
            });
        }

        self.in_progress.remove(name);
        let desc = Arc::new(MessageDescriptor {
            name: decl.name.clone(),
            fields,
        });
        self.messages.insert(name.to_string(), desc.clone());
        Ok(desc)
    }

    fn union(&mut self, name: &str) -> Result<Arc<UnionDescriptor>, SchemaError> {
        if let Some(done) = self.unions.get(name) {
            return Ok(done.clone());
        }
        let decl = *self
            .union_decls
            .get(name)
            .ok_or_else(|| unresolved("unions", name))?;
        let discriminator = self.enumeration(&decl.enum_name)?;
        let mut variants = Vec::with_capacity(decl.variants.len());
        for variant in &decl.variants {
            let value = discriminator
                .lookup(&variant.value)
                .ok_or_else(|| SchemaError::Resolve {
                    path: format!("unions.{name}"),
                    message: format!(
                        "`{}` is not a value of enum `{}`",
                        variant.value, discriminator.name
                    ),
                })?;
            let (number, value_name) = (value.number, value.name.clone());
            variants.push(UnionVariant {
                value: number,
                name: value_name,
                message: self.message(&variant.message)?,
            });
        }
        let desc = Arc::new(UnionDescriptor {
            name: decl.name.clone(),
            discriminator,
            type_field: decl.type_field.clone().unwrap_or_else(|| "Type".to_string()),
            value_field: decl
                .value_field
                .clone()
                .unwrap_or_else(|| "Field".to_string()),
            variants,
        });
        self.unions.insert(name.to_string(), desc.clone());
        Ok(desc)
    }

    fn scalar(&mut self, name: &str, path: &str) -> Result<ScalarKind, SchemaError> {
        if let Some(kind) = ScalarKind::from_name(name) {
            return Ok(kind);
        }
        if self.enum_decls.contains_key(name) {
            return Ok(ScalarKind::Enum(self.enumeration(name)?));
        }
        Err(SchemaError::Resolve {
            path: path.to_string(),
            message: format!("`{name}` is not a scalar or enum type"),
        })
    }

    fn elem(&mut self, name: &str, path: &str) -> Result<ElemKind, SchemaError> {
        if self.message_decls.contains_key(name) {
            return Ok(ElemKind::Message(self.message(name)?));
        }
        Ok(ElemKind::Scalar(self.scalar(name, path)?))
    }

    fn field_kind(&mut self, expr: &TypeExpr, path: &str) -> Result<FieldKind, SchemaError> {
        Ok(match expr {
            TypeExpr::Single(name) => {
                if self.message_decls.contains_key(name.as_str()) {
                    FieldKind::Message(self.message(name)?)
                } else if self.union_decls.contains_key(name.as_str()) {
                    FieldKind::Union(self.union(name)?)
                } else {
                    FieldKind::Scalar(self.scalar(name, path)?)
                }
            }
            TypeExpr::List(name) => FieldKind::List(self.elem(name, path)?),
            TypeExpr::Map { key, value } => FieldKind::Map {
                key: self.scalar(key, path)?,
                value: self.elem(value, path)?,
            },
        })
    }
}

fn unresolved(section: &str, name: &str) -> SchemaError {
    SchemaError::Resolve {
        path: section.to_string(),
        message: format!("unknown type `{name}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_defaults_follow_the_book() {
        let book = header_layout(None, None, None, None, None, None, None);
        assert_eq!(book, HeaderLayout::default());
        assert_eq!(book.datarow, 4);

        let sheet = header_layout(Some(&book), Some(1), Some(0), Some(0), None, None, None);
        assert_eq!(sheet.typerow, None);
        assert_eq!(sheet.noterow, None);
        assert_eq!(sheet.datarow, 2);
    }

    #[test]
    fn explicit_datarow_wins() {
        let layout = header_layout(None, Some(2), Some(3), None, Some(10), Some(1), None);
        assert_eq!(layout.namerow, 2);
        assert_eq!(layout.typerow, Some(3));
        assert_eq!(layout.noterow, Some(3));
        assert_eq!(layout.datarow, 10);
        assert_eq!(layout.nameline, 1);
    }

    #[test]
    fn enum_lookup_by_number_name_and_alias() {
        let desc = EnumDescriptor {
            name: "ItemType".into(),
            values: vec![
                EnumValue {
                    name: "ITEM_TYPE_UNKNOWN".into(),
                    number: 0,
                    alias: None,
                },
                EnumValue {
                    name: "ITEM_TYPE_FRUIT".into(),
                    number: 1,
                    alias: Some("Fruit".into()),
                },
            ],
        };
        assert_eq!(desc.lookup("1").map(|v| v.number), Some(1));
        assert_eq!(desc.lookup("ITEM_TYPE_FRUIT").map(|v| v.number), Some(1));
        assert_eq!(desc.lookup(" Fruit ").map(|v| v.number), Some(1));
        assert!(desc.lookup("7").is_none());
        assert!(desc.lookup("Vegetable").is_none());
    }
}
