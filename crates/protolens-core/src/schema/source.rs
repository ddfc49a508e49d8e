use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::descriptor::Schema;
use super::error::SchemaError;

/// Unbound schema description, as read from a JSON descriptor file or built
/// in code.
///
/// Type names are kept as written; they are resolved when the source is
/// bound into a [`Schema`].
///
/// # Examples
/// ```
/// use protolens_core::schema::{FieldDef, MessageDef, SchemaSource};
///
/// let schema = SchemaSource::new()
///     .message(
///         MessageDef::new("demo.Person")
///             .field(FieldDef::new(1, "name", "string"))
///             .field(FieldDef::new(2, "id", "int32")),
///     )
///     .bind()?;
/// assert!(schema.message_by_name("demo.Person").is_some());
/// # Ok::<(), protolens_core::schema::SchemaError>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaSource {
    /// Default root message type, used when the caller does not pick one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub messages: Vec<MessageDef>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDef {
    /// Fully-qualified name, e.g. `demo.Person`.
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub id: u32,
    pub name: String,
    /// Semantic type name: a scalar name, or a message/enum reference.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub repeated: bool,
    #[serde(default)]
    pub packed: bool,
    #[serde(default, rename = "map")]
    pub is_map: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValueDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValueDef {
    pub name: String,
    pub number: i32,
}

impl SchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON descriptor document.
    ///
    /// # Errors
    /// Returns `SchemaError::Json` when the document does not match the
    /// descriptor format.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn message(mut self, message: MessageDef) -> Self {
        self.messages.push(message);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumDef) -> Self {
        self.enums.push(enumeration);
        self
    }

    /// Resolve every type name and build the read-only descriptor tree.
    pub fn bind(self) -> Result<Schema, SchemaError> {
        Schema::bind(self)
    }
}

impl MessageDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

impl FieldDef {
    pub fn new(id: u32, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            type_name: type_name.into(),
            repeated: false,
            packed: false,
            is_map: false,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Mark as `repeated` and packed.
    pub fn packed(mut self) -> Self {
        self.repeated = true;
        self.packed = true;
        self
    }

    pub fn map(mut self) -> Self {
        self.repeated = true;
        self.is_map = true;
        self
    }
}

impl EnumDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push(EnumValueDef {
            name: name.into(),
            number,
        });
        self
    }
}

/// Read a JSON descriptor file and bind it.
///
/// # Errors
/// Returns `SchemaError` when the file cannot be read, is not a valid
/// descriptor document, or fails binding.
pub fn load_schema_file(path: &Path) -> Result<Schema, SchemaError> {
    let json = fs::read_to_string(path)?;
    SchemaSource::from_json_str(&json)?.bind()
}

#[cfg(test)]
mod tests {
    use super::SchemaSource;
    use crate::schema::SchemaError;

    #[test]
    fn parses_descriptor_json_with_defaults() {
        let source = SchemaSource::from_json_str(
            r#"{
                "root": "demo.Person",
                "messages": [
                    { "name": "demo.Person", "fields": [
                        { "id": 1, "name": "name", "type": "string" },
                        { "id": 3, "name": "scores", "type": "int32", "repeated": true, "packed": true },
                        { "id": 5, "name": "labels", "type": "map<string,string>", "map": true }
                    ] }
                ],
                "enums": [ { "name": "demo.Kind", "values": [ { "name": "KIND_A", "number": 0 } ] } ]
            }"#,
        )
        .unwrap();

        assert_eq!(source.root.as_deref(), Some("demo.Person"));
        let fields = &source.messages[0].fields;
        assert!(!fields[0].repeated);
        assert!(fields[1].packed);
        assert!(fields[2].is_map);
        assert_eq!(source.enums[0].values[0].name, "KIND_A");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SchemaSource::from_json_str("{ \"messages\": 3 }").unwrap_err();
        assert!(matches!(err, SchemaError::Json(_)));
    }
}
