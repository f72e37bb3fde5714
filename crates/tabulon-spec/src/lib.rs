//! Tabulon schema manifest.
//!
//! A manifest declares enums, messages and unions with per-field sheet
//! annotations, plus the worksheets that are compiled into messages.
//! [`Manifest::validate`] reports every problem it finds at once;
//! [`Manifest::resolve`] links a valid manifest into an immutable [`Schema`]
//! consumed by the compiler.

pub mod annotation;
pub mod descriptor;
pub mod manifest;
pub mod types;
pub mod validation;

pub use annotation::*;
pub use descriptor::*;
pub use manifest::*;
pub use types::{MAP_KEY_TYPES, SCALAR_TYPES, TypeExpr, is_scalar_type};
pub use validation::*;

/// JSON Schema for the manifest format as a `serde_json::Value`.
pub fn generate_schema_value() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(Manifest)).unwrap_or(serde_json::Value::Null)
}

/// Pretty-printed JSON Schema for the manifest format.
pub fn generate_schema_json_pretty() -> String {
    serde_json::to_string_pretty(&generate_schema_value()).unwrap_or_default()
}
