use std::collections::{HashMap, HashSet, VecDeque};

use super::error::SchemaError;
use super::scalar::ScalarKind;
use super::source::{FieldDef, SchemaSource};
use crate::wire::layout::MAX_FIELD_NUMBER;

/// Index of a message type inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(usize);

/// Index of an enum type inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(usize);

/// What a field's type name resolved to at binding time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Message(MessageId),
    Enum(EnumId),
    /// `map<K, V>` field; decoded as a placeholder.
    Map,
    /// Type name matched neither a scalar nor a known message or enum.
    Unsupported,
}

/// Nested type a field refers to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Message(MessageId),
    Enum(EnumId),
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    id: u32,
    name: String,
    type_name: String,
    repeated: bool,
    packed: bool,
    is_map: bool,
    kind: FieldKind,
}

impl FieldDescriptor {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name as written in the schema source.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    pub fn is_packed(&self) -> bool {
        self.packed
    }

    pub fn is_map(&self) -> bool {
        self.is_map
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn resolved(&self) -> Option<Resolved> {
        match self.kind {
            FieldKind::Message(id) => Some(Resolved::Message(id)),
            FieldKind::Enum(id) => Some(Resolved::Enum(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    by_number: HashMap<u32, usize>,
}

impl MessageDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number.get(&number).map(|&index| &self.fields[index])
    }
}

#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    name: String,
    values: Vec<(String, i32)>,
}

impl EnumDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First declared name for `number` (aliases share a number).
    pub fn value_name(&self, number: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, value)| *value == number)
            .map(|(name, _)| name.as_str())
    }
}

/// Bound, read-only descriptor tree.
///
/// Every field's type name is resolved exactly once, when the schema is
/// bound, so decoding never dispatches on strings.
///
/// # Examples
/// ```
/// use protolens_core::schema::{FieldDef, FieldKind, MessageDef, SchemaSource};
///
/// let schema = SchemaSource::new()
///     .message(MessageDef::new("demo.Person").field(FieldDef::new(4, "home", "Address")))
///     .message(MessageDef::new("demo.Address").field(FieldDef::new(1, "city", "string")))
///     .bind()?;
/// let person = schema.message(schema.message_by_name("demo.Person").unwrap());
/// let home = person.field_by_number(4).unwrap();
/// assert!(matches!(home.kind(), FieldKind::Message(_)));
/// assert_eq!(schema.reachable_messages("demo.Person")?, ["demo.Person", "demo.Address"]);
/// # Ok::<(), protolens_core::schema::SchemaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    root: Option<String>,
    messages: Vec<MessageDescriptor>,
    enums: Vec<EnumDescriptor>,
    message_index: HashMap<String, MessageId>,
    enum_index: HashMap<String, EnumId>,
}

impl Schema {
    pub(crate) fn bind(source: SchemaSource) -> Result<Self, SchemaError> {
        let mut message_index = HashMap::new();
        let mut enum_index = HashMap::new();
        for (index, message) in source.messages.iter().enumerate() {
            let name = normalize_name(&message.name);
            if message_index.insert(name.clone(), MessageId(index)).is_some() {
                return Err(SchemaError::DuplicateTypeName { name });
            }
        }
        for (index, enumeration) in source.enums.iter().enumerate() {
            let name = normalize_name(&enumeration.name);
            if message_index.contains_key(&name)
                || enum_index.insert(name.clone(), EnumId(index)).is_some()
            {
                return Err(SchemaError::DuplicateTypeName { name });
            }
        }

        let resolver = TypeResolver {
            messages: &message_index,
            enums: &enum_index,
        };
        let messages = source
            .messages
            .iter()
            .map(|message| {
                let name = normalize_name(&message.name);
                bind_message(&resolver, name, &message.fields)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let enums = source
            .enums
            .into_iter()
            .map(|enumeration| EnumDescriptor {
                name: normalize_name(&enumeration.name),
                values: enumeration
                    .values
                    .into_iter()
                    .map(|value| (value.name, value.number))
                    .collect(),
            })
            .collect();

        Ok(Self {
            root: source.root.map(|root| normalize_name(&root)),
            messages,
            enums,
            message_index,
            enum_index,
        })
    }

    /// Default root type declared by the schema source, if any.
    pub fn default_root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn message(&self, id: MessageId) -> &MessageDescriptor {
        &self.messages[id.0]
    }

    pub fn enum_type(&self, id: EnumId) -> &EnumDescriptor {
        &self.enums[id.0]
    }

    /// Look up a message by fully-qualified name; a leading `.` is accepted.
    pub fn message_by_name(&self, name: &str) -> Option<MessageId> {
        self.message_index
            .get(name.strip_prefix('.').unwrap_or(name))
            .copied()
    }

    pub fn enum_by_name(&self, name: &str) -> Option<EnumId> {
        self.enum_index
            .get(name.strip_prefix('.').unwrap_or(name))
            .copied()
    }

    /// All message names in declaration order.
    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|message| message.name.as_str())
    }

    /// Message names reachable from `root` through message-typed fields,
    /// breadth-first, root first, each name once.
    pub fn reachable_messages(&self, root: &str) -> Result<Vec<&str>, SchemaError> {
        let root_id = self
            .message_by_name(root)
            .ok_or_else(|| SchemaError::UnknownMessage {
                name: root.to_string(),
            })?;

        let mut seen = HashSet::from([root_id]);
        let mut queue = VecDeque::from([root_id]);
        let mut names = Vec::new();
        while let Some(id) = queue.pop_front() {
            let message = self.message(id);
            names.push(message.name());
            for field in message.fields() {
                if let FieldKind::Message(nested) = field.kind() {
                    if seen.insert(nested) {
                        queue.push_back(nested);
                    }
                }
            }
        }
        Ok(names)
    }
}

struct TypeResolver<'a> {
    messages: &'a HashMap<String, MessageId>,
    enums: &'a HashMap<String, EnumId>,
}

impl TypeResolver<'_> {
    /// Resolve `type_name` as seen from inside message `scope`.
    ///
    /// Scalars win; a leading `.` is fully qualified; otherwise the name is
    /// tried against each enclosing scope from the innermost outward.
    fn resolve(&self, scope: &str, type_name: &str) -> FieldKind {
        if let Some(kind) = ScalarKind::from_type_name(type_name) {
            return FieldKind::Scalar(kind);
        }
        if let Some(full) = type_name.strip_prefix('.') {
            return self.lookup(full).unwrap_or(FieldKind::Unsupported);
        }

        let mut scope = Some(scope);
        while let Some(current) = scope {
            let candidate = if current.is_empty() {
                type_name.to_string()
            } else {
                format!("{current}.{type_name}")
            };
            if let Some(kind) = self.lookup(&candidate) {
                return kind;
            }
            scope = match current.rfind('.') {
                Some(dot) => Some(&current[..dot]),
                None if current.is_empty() => None,
                None => Some(""),
            };
        }
        FieldKind::Unsupported
    }

    fn lookup(&self, name: &str) -> Option<FieldKind> {
        if let Some(id) = self.messages.get(name) {
            return Some(FieldKind::Message(*id));
        }
        self.enums.get(name).map(|id| FieldKind::Enum(*id))
    }
}

fn bind_message(
    resolver: &TypeResolver<'_>,
    name: String,
    defs: &[FieldDef],
) -> Result<MessageDescriptor, SchemaError> {
    let mut fields = Vec::with_capacity(defs.len());
    let mut by_number = HashMap::with_capacity(defs.len());
    for def in defs {
        if def.id == 0 || def.id > MAX_FIELD_NUMBER {
            return Err(SchemaError::InvalidFieldNumber {
                message: name,
                id: def.id,
            });
        }
        if by_number.insert(def.id, fields.len()).is_some() {
            return Err(SchemaError::DuplicateFieldNumber {
                message: name,
                id: def.id,
            });
        }
        let kind = if def.is_map {
            FieldKind::Map
        } else {
            resolver.resolve(&name, &def.type_name)
        };
        fields.push(FieldDescriptor {
            id: def.id,
            name: def.name.clone(),
            type_name: def.type_name.clone(),
            repeated: def.repeated,
            packed: def.packed,
            is_map: def.is_map,
            kind,
        });
    }
    Ok(MessageDescriptor {
        name,
        fields,
        by_number,
    })
}

fn normalize_name(name: &str) -> String {
    name.strip_prefix('.').unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use crate::schema::{
        EnumDef, FieldDef, FieldKind, MessageDef, ScalarKind, SchemaError, SchemaSource,
    };

    fn nested_source() -> SchemaSource {
        SchemaSource::new()
            .message(
                MessageDef::new("demo.Person")
                    .field(FieldDef::new(1, "name", "string"))
                    .field(FieldDef::new(2, "home", "Address"))
                    .field(FieldDef::new(3, "kind", "Kind"))
                    .field(FieldDef::new(4, "work", ".other.Address"))
                    .field(FieldDef::new(5, "pet", "Pet"))
                    .field(FieldDef::new(6, "blob", "Any")),
            )
            .message(
                MessageDef::new("demo.Person.Address").field(FieldDef::new(1, "city", "string")),
            )
            .message(MessageDef::new("demo.Address"))
            .message(MessageDef::new(".other.Address"))
            .message(MessageDef::new("Pet"))
            .enumeration(EnumDef::new("demo.Kind").value("KIND_A", 0).value("KIND_B", 1))
    }

    #[test]
    fn resolves_innermost_scope_first() {
        let schema = nested_source().bind().unwrap();
        let person = schema.message(schema.message_by_name("demo.Person").unwrap());

        let home = person.field_by_number(2).unwrap();
        let inner = schema.message_by_name("demo.Person.Address").unwrap();
        assert_eq!(home.kind(), FieldKind::Message(inner));

        let work = person.field_by_number(4).unwrap();
        let other = schema.message_by_name("other.Address").unwrap();
        assert_eq!(work.kind(), FieldKind::Message(other));

        let pet = person.field_by_number(5).unwrap();
        assert_eq!(pet.kind(), FieldKind::Message(schema.message_by_name("Pet").unwrap()));
    }

    #[test]
    fn resolves_scalars_enums_and_unsupported() {
        let schema = nested_source().bind().unwrap();
        let person = schema.message(schema.message_by_name("demo.Person").unwrap());

        assert_eq!(
            person.field_by_number(1).unwrap().kind(),
            FieldKind::Scalar(ScalarKind::String)
        );
        let kind = person.field_by_number(3).unwrap();
        let FieldKind::Enum(enum_id) = kind.kind() else {
            panic!("expected enum kind");
        };
        assert_eq!(schema.enum_type(enum_id).value_name(1), Some("KIND_B"));
        assert_eq!(schema.enum_type(enum_id).value_name(9), None);
        assert_eq!(person.field_by_number(6).unwrap().kind(), FieldKind::Unsupported);
    }

    #[test]
    fn map_flag_overrides_type_name() {
        let schema = SchemaSource::new()
            .message(MessageDef::new("M").field(FieldDef::new(1, "labels", "string").map()))
            .bind()
            .unwrap();
        let message = schema.message(schema.message_by_name("M").unwrap());
        let field = message.field_by_number(1).unwrap();
        assert_eq!(field.kind(), FieldKind::Map);
        assert!(field.resolved().is_none());
    }

    #[test]
    fn rejects_duplicate_field_numbers() {
        let err = SchemaSource::new()
            .message(
                MessageDef::new("M")
                    .field(FieldDef::new(1, "a", "int32"))
                    .field(FieldDef::new(1, "b", "int32")),
            )
            .bind()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateFieldNumber { id: 1, .. }));
    }

    #[test]
    fn rejects_field_number_zero() {
        let err = SchemaSource::new()
            .message(MessageDef::new("M").field(FieldDef::new(0, "a", "int32")))
            .bind()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFieldNumber { id: 0, .. }));
    }

    #[test]
    fn rejects_duplicate_type_names() {
        let err = SchemaSource::new()
            .message(MessageDef::new("demo.Kind"))
            .enumeration(EnumDef::new("demo.Kind"))
            .bind()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTypeName { .. }));
    }

    #[test]
    fn reachable_messages_handles_cycles() {
        let schema = SchemaSource::new()
            .message(
                MessageDef::new("Node")
                    .field(FieldDef::new(1, "child", "Node").repeated())
                    .field(FieldDef::new(2, "leaf", "Leaf")),
            )
            .message(MessageDef::new("Leaf"))
            .message(MessageDef::new("Orphan"))
            .bind()
            .unwrap();
        assert_eq!(schema.reachable_messages("Node").unwrap(), ["Node", "Leaf"]);
        assert!(matches!(
            schema.reachable_messages("Missing"),
            Err(SchemaError::UnknownMessage { .. })
        ));
    }
}
