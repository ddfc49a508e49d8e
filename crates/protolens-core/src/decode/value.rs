use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Decoded scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    /// Enum number plus its declared name, when the enum defines one.
    Enum { number: i32, name: Option<String> },
}

/// Why a field occurrence was skipped instead of decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No descriptor for the field number.
    UnknownField,
    /// Map fields are not decoded.
    MapField,
    /// Type name matched no scalar, message or enum.
    UnsupportedType,
    /// Wire type disagrees with the field's declared type.
    WireTypeMismatch,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::UnknownField => "unknown",
            SkipReason::MapField => "map",
            SkipReason::UnsupportedType => "unsupported",
            SkipReason::WireTypeMismatch => "wire_type_mismatch",
        }
    }
}

/// Decoded message: field name to value, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageValue {
    fields: Vec<(String, DecodedValue)>,
}

impl MessageValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&DecodedValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecodedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Assign `value` to `name`; a later occurrence replaces an earlier one
    /// but keeps its position.
    pub(crate) fn set(&mut self, name: &str, value: DecodedValue) {
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Append to the sequence stored under `name` and return the element's
    /// index, i.e. the sequence length before the append.
    pub(crate) fn push_repeated(&mut self, name: &str, value: DecodedValue) -> usize {
        if let Some((_, DecodedValue::Repeated(items))) =
            self.fields.iter_mut().find(|(field, _)| field == name)
        {
            items.push(value);
            return items.len() - 1;
        }
        self.set(name, DecodedValue::Repeated(vec![value]));
        0
    }

    /// Index the next element appended under `name` will get.
    pub(crate) fn next_index(&self, name: &str) -> usize {
        match self.get(name) {
            Some(DecodedValue::Repeated(items)) => items.len(),
            _ => 0,
        }
    }

    /// Append `items` to the sequence under `name`, creating it (possibly
    /// empty) if absent, and return the whole sequence.
    pub(crate) fn extend_repeated(
        &mut self,
        name: &str,
        items: Vec<DecodedValue>,
    ) -> &DecodedValue {
        let index = match self.fields.iter().position(|(field, _)| field == name) {
            Some(index) => index,
            None => {
                self.fields
                    .push((name.to_string(), DecodedValue::Repeated(Vec::new())));
                self.fields.len() - 1
            }
        };
        if let DecodedValue::Repeated(existing) = &mut self.fields[index].1 {
            existing.extend(items);
        } else {
            self.fields[index].1 = DecodedValue::Repeated(items);
        }
        &self.fields[index].1
    }
}

/// Node of the decoded value tree.
///
/// # Examples
/// ```
/// use protolens_core::decode::{DecodedValue, ScalarValue};
///
/// let value = DecodedValue::Repeated(vec![
///     DecodedValue::Scalar(ScalarValue::I32(1)),
///     DecodedValue::Scalar(ScalarValue::Bytes(vec![0xde, 0xad])),
/// ]);
/// assert_eq!(serde_json::to_string(&value).unwrap(), r#"[1,"dead"]"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Scalar(ScalarValue),
    Repeated(Vec<DecodedValue>),
    Message(MessageValue),
    Skipped(SkipReason),
}

impl DecodedValue {
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            DecodedValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&[DecodedValue]> {
        match self {
            DecodedValue::Repeated(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageValue> {
        match self {
            DecodedValue::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            DecodedValue::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<ScalarValue> for DecodedValue {
    fn from(value: ScalarValue) -> Self {
        DecodedValue::Scalar(value)
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::I32(v) => serializer.serialize_i32(*v),
            ScalarValue::I64(v) => serializer.serialize_i64(*v),
            ScalarValue::U32(v) => serializer.serialize_u32(*v),
            ScalarValue::U64(v) => serializer.serialize_u64(*v),
            ScalarValue::F32(v) => serializer.serialize_f32(*v),
            ScalarValue::F64(v) => serializer.serialize_f64(*v),
            ScalarValue::Bool(v) => serializer.serialize_bool(*v),
            ScalarValue::String(v) => serializer.serialize_str(v),
            ScalarValue::Bytes(v) => serializer.serialize_str(&format_hex(v)),
            ScalarValue::Enum {
                name: Some(name), ..
            } => serializer.serialize_str(name),
            ScalarValue::Enum { number, name: None } => serializer.serialize_i32(*number),
        }
    }
}

impl Serialize for MessageValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DecodedValue::Scalar(value) => value.serialize(serializer),
            DecodedValue::Repeated(items) => serializer.collect_seq(items),
            DecodedValue::Message(message) => message.serialize(serializer),
            DecodedValue::Skipped(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("skipped", reason.as_str())?;
                map.end()
            }
        }
    }
}

fn format_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
