//! Schema view consumed by the decoder.
//!
//! - `source`: serde-backed descriptor documents and builders
//! - `descriptor`: the bound, read-only descriptor tree
//! - `scalar`: the closed set of scalar kinds and their primitive reads
//! - `error`: loading and binding errors
//!
//! Binding resolves every field's type name once into a [`FieldKind`];
//! names that match nothing bind to [`FieldKind::Unsupported`] instead of
//! failing, and the decoder skips such fields at runtime.

pub mod descriptor;
pub mod error;
pub mod scalar;
pub mod source;

pub use descriptor::{
    EnumDescriptor, EnumId, FieldDescriptor, FieldKind, MessageDescriptor, MessageId, Resolved,
    Schema,
};
pub use error::SchemaError;
pub use scalar::ScalarKind;
pub use source::{EnumDef, EnumValueDef, FieldDef, MessageDef, SchemaSource, load_schema_file};
