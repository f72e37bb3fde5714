use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use schemars::JsonSchema;
use semver::Version;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::annotation::{FieldAnnotation, Layout, RangeSpec, Reference, Span};
use crate::types::{MAP_KEY_TYPES, TypeExpr, is_scalar_type};
use crate::validation::{ManifestIssue, SchemaError, ValidationError};

/// Current supported manifest version.
pub const CURRENT_SPEC_VERSION: &str = "0.2.0";
/// Constant identifier for this manifest format.
pub const SPEC_IDENT: &str = "tabulon";

pub const DEFAULT_SEP: &str = ",";
pub const DEFAULT_SUBSEP: &str = ":";
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_NAMEROW: u32 = 1;
pub const DEFAULT_TYPEROW: u32 = 2;
pub const DEFAULT_NOTEROW: u32 = 3;
pub const DEFAULT_DATAROW: u32 = 4;

/// Canonical schema manifest.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(
    title = "Tabulon schema manifest",
    description = "Message, enum and union declarations plus the sheets that are compiled into them."
)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Identifier for this format (must be `tabulon`).
    pub spec: String,
    #[schemars(with = "String")]
    pub spec_version: SpecVersion,
    /// Workbook-wide defaults.
    #[serde(default)]
    pub book: BookOptions,
    #[serde(default)]
    pub enums: Vec<EnumDecl>,
    #[serde(default)]
    pub messages: Vec<MessageDecl>,
    #[serde(default)]
    pub unions: Vec<UnionDecl>,
    /// Worksheets compiled into messages.
    #[serde(default)]
    pub sheets: Vec<SheetDecl>,
}

/// Workbook-level options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BookOptions {
    #[serde(default)]
    pub name: Option<String>,
    /// Default in-cell element separator (`,`).
    #[serde(default)]
    pub sep: Option<String>,
    /// Default in-cell sub-separator (`:`).
    #[serde(default)]
    pub subsep: Option<String>,
    /// Time zone used for date-times without an offset: `UTC` or `+08:00`.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub namerow: Option<u32>,
    #[serde(default)]
    pub typerow: Option<u32>,
    #[serde(default)]
    pub noterow: Option<u32>,
    #[serde(default)]
    pub datarow: Option<u32>,
    #[serde(default)]
    pub nameline: Option<u32>,
    #[serde(default)]
    pub typeline: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EnumDecl {
    pub name: String,
    pub values: Vec<EnumValueDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EnumValueDecl {
    pub name: String,
    pub number: i32,
    /// Human-friendly spelling accepted in cells.
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MessageDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    /// Field number; defaults to the 1-based declaration position.
    #[serde(default)]
    pub number: Option<u32>,
    /// Type expression: `int32`, `Item`, `[Item]` or `map<uint32, Item>`.
    #[serde(rename = "type")]
    pub type_expr: String,
    #[serde(default)]
    pub options: Option<FieldAnnotation>,
}

/// Tagged union selected by an enum discriminator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UnionDecl {
    pub name: String,
    /// Discriminator enum.
    #[serde(rename = "enum")]
    pub enum_name: String,
    /// Column suffix of the discriminator (default `Type`).
    #[serde(default)]
    pub type_field: Option<String>,
    /// Column stem of numbered payload cells (default `Field`).
    #[serde(default)]
    pub value_field: Option<String>,
    pub variants: Vec<UnionVariantDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UnionVariantDecl {
    /// Discriminator enum value (name, alias or number).
    pub value: String,
    /// Payload message.
    pub message: String,
}

/// A worksheet compiled into one message.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SheetDecl {
    /// Message built from the sheet.
    pub message: String,
    /// Worksheet name; defaults to the message name.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub namerow: Option<u32>,
    #[serde(default)]
    pub typerow: Option<u32>,
    #[serde(default)]
    pub noterow: Option<u32>,
    #[serde(default)]
    pub datarow: Option<u32>,
    #[serde(default)]
    pub nameline: Option<u32>,
    #[serde(default)]
    pub typeline: Option<u32>,
    /// One record per column instead of per row.
    #[serde(default)]
    pub transpose: bool,
    /// Every field tolerates missing columns.
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub sep: Option<String>,
    #[serde(default)]
    pub subsep: Option<String>,
    /// Extra sheets parsed into the same message.
    #[serde(default)]
    pub merger: Vec<String>,
    /// Sheets merged on top of the built message.
    #[serde(default)]
    pub patches: Vec<String>,
}

impl SheetDecl {
    pub fn sheet_name(&self) -> &str {
        self.sheet.as_deref().unwrap_or(&self.message)
    }
}

impl Manifest {
    /// Construct a manifest by reading YAML from any reader.
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    /// Construct a manifest from a YAML string slice.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Read a manifest file.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, SchemaError> {
        let file = std::fs::File::open(path)?;
        Ok(Self::from_yaml_reader(std::io::BufReader::new(file))?)
    }

    /// Serialize this manifest to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Validate the manifest and return granular issues when invariants fail.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.spec != SPEC_IDENT {
            issues.push(ManifestIssue::new(
                "spec",
                format!(
                    "expected spec identifier `{}`, found `{}`",
                    SPEC_IDENT, self.spec
                ),
            ));
        }

        match Version::parse(CURRENT_SPEC_VERSION) {
            Ok(current) if self.spec_version.0.major != current.major => {
                issues.push(ManifestIssue::new(
                    "spec_version",
                    format!(
                        "incompatible major version `{}` (expected `{}`)",
                        self.spec_version.0, current.major
                    ),
                ));
            }
            _ => {}
        }

        for (key, value) in [("book.sep", &self.book.sep), ("book.subsep", &self.book.subsep)] {
            if value.as_deref() == Some("") {
                issues.push(ManifestIssue::new(key, "separator must not be empty"));
            }
        }
        if let Some(tz) = &self.book.timezone {
            if !is_supported_timezone(tz) {
                issues.push(ManifestIssue::new(
                    "book.timezone",
                    format!("unsupported time zone `{tz}` (use `UTC` or an offset like `+08:00`)"),
                ));
            }
        }

        let types = self.check_type_names(&mut issues);
        self.check_enums(&mut issues);
        self.check_messages(&types, &mut issues);
        self.check_unions(&types, &mut issues);
        self.check_sheets(&types, &mut issues);
        self.check_recursion(&mut issues);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }

    fn check_type_names(&self, issues: &mut Vec<ManifestIssue>) -> TypeTable {
        let mut table = TypeTable::default();
        let mut seen = HashSet::new();
        let declared = self
            .enums
            .iter()
            .map(|d| ("enums", d.name.as_str(), TypeClass::Enum))
            .chain(
                self.messages
                    .iter()
                    .map(|d| ("messages", d.name.as_str(), TypeClass::Message)),
            )
            .chain(
                self.unions
                    .iter()
                    .map(|d| ("unions", d.name.as_str(), TypeClass::Union)),
            );
        let mut counters: BTreeMap<&str, usize> = BTreeMap::new();
        for (section, name, class) in declared {
            let idx = counters.entry(section).or_insert(0);
            let path = format!("{section}[{idx}].name");
            *idx += 1;
            if is_scalar_type(name) {
                issues.push(ManifestIssue::new(
                    &path,
                    format!("`{name}` shadows a built-in scalar type"),
                ));
            } else if name.parse::<TypeExpr>() != Ok(TypeExpr::Single(name.to_string())) {
                issues.push(ManifestIssue::new(
                    &path,
                    format!("`{name}` is not a valid type name"),
                ));
            }
            if !seen.insert(name) {
                issues.push(ManifestIssue::new(
                    &path,
                    format!("duplicate type name `{name}`"),
                ));
                continue;
            }
            table.classes.insert(name.to_string(), class);
        }
        table
    }

    fn check_enums(&self, issues: &mut Vec<ManifestIssue>) {
        for (idx, decl) in self.enums.iter().enumerate() {
            if !decl.values.iter().any(|v| v.number == 0) {
                issues.push(ManifestIssue::new(
                    format!("enums[{idx}].values"),
                    format!("enum `{}` must define a value numbered 0", decl.name),
                ));
            }
            let mut names = HashSet::new();
            let mut numbers = HashSet::new();
            for (vidx, value) in decl.values.iter().enumerate() {
                let path = format!("enums[{idx}].values[{vidx}]");
                if !names.insert(value.name.as_str()) {
                    issues.push(ManifestIssue::new(
                        &path,
                        format!("duplicate enum value name `{}`", value.name),
                    ));
                }
                if let Some(alias) = &value.alias {
                    if !names.insert(alias.as_str()) {
                        issues.push(ManifestIssue::new(
                            &path,
                            format!("alias `{alias}` collides with another value"),
                        ));
                    }
                }
                if !numbers.insert(value.number) {
                    issues.push(ManifestIssue::new(
                        &path,
                        format!("duplicate enum value number {}", value.number),
                    ));
                }
            }
        }
    }

    fn check_messages(&self, types: &TypeTable, issues: &mut Vec<ManifestIssue>) {
        for (idx, decl) in self.messages.iter().enumerate() {
            if decl.fields.is_empty() {
                issues.push(ManifestIssue::new(
                    format!("messages[{idx}].fields"),
                    format!("message `{}` must define at least one field", decl.name),
                ));
            }
            let mut names = HashSet::new();
            let mut numbers = HashSet::new();
            for (fidx, field) in decl.fields.iter().enumerate() {
                let path = format!("messages[{idx}].fields[{fidx}]");
                if !names.insert(field.name.as_str()) {
                    issues.push(ManifestIssue::new(
                        format!("{path}.name"),
                        format!("duplicate field name `{}`", field.name),
                    ));
                }
                let number = field.number.unwrap_or(fidx as u32 + 1);
                if number == 0 {
                    issues.push(ManifestIssue::new(
                        format!("{path}.number"),
                        "field numbers start at 1",
                    ));
                } else if !numbers.insert(number) {
                    issues.push(ManifestIssue::new(
                        format!("{path}.number"),
                        format!("duplicate field number {number}"),
                    ));
                }
                self.check_field(field, &path, types, issues);
            }
        }
    }

    fn check_field(
        &self,
        field: &FieldDecl,
        path: &str,
        types: &TypeTable,
        issues: &mut Vec<ManifestIssue>,
    ) {
        let expr = match field.type_expr.parse::<TypeExpr>() {
            Ok(expr) => expr,
            Err(message) => {
                issues.push(ManifestIssue::new(format!("{path}.type"), message));
                return;
            }
        };
        for name in expr.names() {
            if !types.known(name) {
                issues.push(ManifestIssue::new(
                    format!("{path}.type"),
                    format!("unknown type `{name}`"),
                ));
            }
        }
        match &expr {
            TypeExpr::Map { key, value } => {
                if !MAP_KEY_TYPES.contains(&key.as_str()) && types.class(key) != Some(TypeClass::Enum)
                {
                    issues.push(ManifestIssue::new(
                        format!("{path}.type"),
                        format!("`{key}` cannot be used as a map key"),
                    ));
                }
                if types.class(value) == Some(TypeClass::Union) {
                    issues.push(ManifestIssue::new(
                        format!("{path}.type"),
                        "unions cannot be used as map values",
                    ));
                }
            }
            TypeExpr::List(elem) if types.class(elem) == Some(TypeClass::Union) => {
                issues.push(ManifestIssue::new(
                    format!("{path}.type"),
                    "unions cannot be used as list elements",
                ));
            }
            _ => {}
        }

        let Some(options) = &field.options else {
            return;
        };
        let is_collection = matches!(expr, TypeExpr::List(_) | TypeExpr::Map { .. });
        if let Some(layout) = options.layout {
            if layout != Layout::Default && !is_collection {
                issues.push(ManifestIssue::new(
                    format!("{path}.options.layout"),
                    format!("layout `{layout}` only applies to lists and maps"),
                ));
            }
        }
        if options.span == Some(Span::InnerCell) {
            if let TypeExpr::Single(name) = &expr {
                if types.class(name) != Some(TypeClass::Message) {
                    issues.push(ManifestIssue::new(
                        format!("{path}.options.span"),
                        "inner_cell span only applies to messages, lists and maps",
                    ));
                }
            }
        }
        for (key, value) in [("sep", &options.sep), ("subsep", &options.subsep)] {
            if value.as_deref() == Some("") {
                issues.push(ManifestIssue::new(
                    format!("{path}.options.{key}"),
                    "separator must not be empty",
                ));
            }
        }
        if let Some(prop) = &options.prop {
            if let Some(range) = &prop.range {
                if let Err(message) = range.parse::<RangeSpec>() {
                    issues.push(ManifestIssue::new(format!("{path}.options.prop.range"), message));
                }
            }
            if let Some(refer) = &prop.refer {
                if let Err(message) = refer.parse::<Reference>() {
                    issues.push(ManifestIssue::new(format!("{path}.options.prop.refer"), message));
                }
            }
            if prop.size == Some(0) {
                issues.push(ManifestIssue::new(
                    format!("{path}.options.prop.size"),
                    "size must be at least 1",
                ));
            }
            if prop.cells == Some(0) {
                issues.push(ManifestIssue::new(
                    format!("{path}.options.prop.cells"),
                    "cells must be at least 1",
                ));
            }
            if prop.sequence.is_some() && !matches!(expr, TypeExpr::Map { .. } | TypeExpr::List(_))
            {
                issues.push(ManifestIssue::new(
                    format!("{path}.options.prop.sequence"),
                    "sequence only applies to maps and keyed lists",
                ));
            }
        }
    }

    fn check_unions(&self, types: &TypeTable, issues: &mut Vec<ManifestIssue>) {
        for (idx, decl) in self.unions.iter().enumerate() {
            let enum_decl = self.enums.iter().find(|e| e.name == decl.enum_name);
            if enum_decl.is_none() {
                issues.push(ManifestIssue::new(
                    format!("unions[{idx}].enum"),
                    format!("unknown discriminator enum `{}`", decl.enum_name),
                ));
            }
            if decl.variants.is_empty() {
                issues.push(ManifestIssue::new(
                    format!("unions[{idx}].variants"),
                    format!("union `{}` must define at least one variant", decl.name),
                ));
            }
            let mut seen = HashSet::new();
            for (vidx, variant) in decl.variants.iter().enumerate() {
                let path = format!("unions[{idx}].variants[{vidx}]");
                if types.class(&variant.message) != Some(TypeClass::Message) {
                    issues.push(ManifestIssue::new(
                        format!("{path}.message"),
                        format!("unknown payload message `{}`", variant.message),
                    ));
                }
                let Some(enum_decl) = enum_decl else {
                    continue;
                };
                let number = enum_decl
                    .values
                    .iter()
                    .find(|v| {
                        v.name == variant.value
                            || v.alias.as_deref() == Some(variant.value.as_str())
                            || variant.value.parse::<i32>().ok() == Some(v.number)
                    })
                    .map(|v| v.number);
                match number {
                    None => issues.push(ManifestIssue::new(
                        format!("{path}.value"),
                        format!(
                            "`{}` is not a value of enum `{}`",
                            variant.value, enum_decl.name
                        ),
                    )),
                    Some(0) => issues.push(ManifestIssue::new(
                        format!("{path}.value"),
                        "the zero discriminator means \"no payload\" and cannot select a variant",
                    )),
                    Some(number) => {
                        if !seen.insert(number) {
                            issues.push(ManifestIssue::new(
                                format!("{path}.value"),
                                format!("discriminator {number} selects more than one variant"),
                            ));
                        }
                    }
                }
            }
        }
    }

    fn check_sheets(&self, types: &TypeTable, issues: &mut Vec<ManifestIssue>) {
        let mut seen = HashSet::new();
        for (idx, decl) in self.sheets.iter().enumerate() {
            let path = format!("sheets[{idx}]");
            if types.class(&decl.message) != Some(TypeClass::Message) {
                issues.push(ManifestIssue::new(
                    format!("{path}.message"),
                    format!("unknown message `{}`", decl.message),
                ));
            }
            if !seen.insert(decl.sheet_name()) {
                issues.push(ManifestIssue::new(
                    format!("{path}.sheet"),
                    format!("duplicate sheet `{}`", decl.sheet_name()),
                ));
            }
            let layout = crate::descriptor::header_layout(
                Some(&crate::descriptor::header_layout(
                    None,
                    self.book.namerow,
                    self.book.typerow,
                    self.book.noterow,
                    self.book.datarow,
                    self.book.nameline,
                    self.book.typeline,
                )),
                decl.namerow,
                decl.typerow,
                decl.noterow,
                decl.datarow,
                decl.nameline,
                decl.typeline,
            );
            if layout.namerow == 0 {
                issues.push(ManifestIssue::new(
                    format!("{path}.namerow"),
                    "rows are 1-based",
                ));
            }
            if layout.datarow <= layout.last_header_row() {
                issues.push(ManifestIssue::new(
                    format!("{path}.datarow"),
                    format!(
                        "data row {} must come after the header rows (last header row {})",
                        layout.datarow,
                        layout.last_header_row()
                    ),
                ));
            }
            for (key, value) in [("sep", &decl.sep), ("subsep", &decl.subsep)] {
                if value.as_deref() == Some("") {
                    issues.push(ManifestIssue::new(
                        format!("{path}.{key}"),
                        "separator must not be empty",
                    ));
                }
            }
            if decl.merger.iter().any(|m| m == decl.sheet_name()) {
                issues.push(ManifestIssue::new(
                    format!("{path}.merger"),
                    "a sheet cannot merge itself",
                ));
            }
            if decl.patches.iter().any(|p| p == decl.sheet_name()) {
                issues.push(ManifestIssue::new(
                    format!("{path}.patches"),
                    "a sheet cannot patch itself",
                ));
            }
        }
    }

    /// Messages must not contain themselves, directly or through other
    /// messages, lists, maps or unions.
    fn check_recursion(&self, issues: &mut Vec<ManifestIssue>) {
        let mut edges: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let unions: BTreeMap<&str, &UnionDecl> =
            self.unions.iter().map(|u| (u.name.as_str(), u)).collect();
        for decl in &self.messages {
            let targets = edges.entry(decl.name.as_str()).or_default();
            for field in &decl.fields {
                let Ok(expr) = field.type_expr.parse::<TypeExpr>() else {
                    continue;
                };
                for name in expr.names() {
                    if let Some(union) = unions.get(name) {
                        targets.extend(union.variants.iter().map(|v| v.message.as_str()));
                    } else if let Some(msg) = self.messages.iter().find(|m| m.name == name) {
                        targets.insert(msg.name.as_str());
                    }
                }
            }
        }

        let mut reported = HashSet::new();
        for (idx, decl) in self.messages.iter().enumerate() {
            let mut stack: Vec<&str> = edges
                .get(decl.name.as_str())
                .map(|t| t.iter().copied().collect())
                .unwrap_or_default();
            let mut visited = HashSet::new();
            while let Some(next) = stack.pop() {
                if next == decl.name {
                    if reported.insert(decl.name.as_str()) {
                        issues.push(ManifestIssue::new(
                            format!("messages[{idx}]"),
                            format!("message `{}` contains itself", decl.name),
                        ));
                    }
                    break;
                }
                if visited.insert(next) {
                    if let Some(targets) = edges.get(next) {
                        stack.extend(targets.iter().copied());
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeClass {
    Enum,
    Message,
    Union,
}

#[derive(Debug, Default)]
struct TypeTable {
    classes: BTreeMap<String, TypeClass>,
}

impl TypeTable {
    fn class(&self, name: &str) -> Option<TypeClass> {
        self.classes.get(name).copied()
    }

    fn known(&self, name: &str) -> bool {
        is_scalar_type(name) || self.classes.contains_key(name)
    }
}

/// Time zones accepted for date-time cells without an explicit offset.
pub fn is_supported_timezone(tz: &str) -> bool {
    parse_utc_offset_seconds(tz).is_some()
}

/// Parse `UTC`, `Z` or `±HH:MM` into an offset in seconds east of UTC.
pub fn parse_utc_offset_seconds(tz: &str) -> Option<i32> {
    let tz = tz.trim();
    if tz.eq_ignore_ascii_case("utc") || tz == "Z" {
        return Some(0);
    }
    let (sign, rest) = match tz.as_bytes().first()? {
        b'+' => (1, &tz[1..]),
        b'-' => (-1, &tz[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

/// Wrapper around semver::Version for serde compatibility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecVersion(pub Version);

impl SpecVersion {
    pub fn new(version: Version) -> Self {
        Self(version)
    }
}

impl Serialize for SpecVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;

        impl<'de> Visitor<'de> for VersionVisitor {
            type Value = SpecVersion;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("semantic version string (e.g. 0.2.0)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Version::parse(v)
                    .map(SpecVersion)
                    .map_err(|err| de::Error::custom(format!("invalid spec_version: {err}")))
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}

impl std::str::FromStr for Manifest {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Manifest::from_yaml_str(s)
    }
}
