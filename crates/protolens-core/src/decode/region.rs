use std::ops::Range;

use serde::Serialize;

use super::value::DecodedValue;
use crate::wire::WireType;

/// Byte span of one decoded field occurrence.
///
/// `start`/`end` are absolute offsets into the decoded buffer at every
/// nesting depth, and `start < end` always holds.
///
/// # Examples
/// ```
/// use protolens_core::decode::{ByteRegion, DecodedValue, ScalarValue};
/// use protolens_core::wire::WireType;
///
/// let region = ByteRegion {
///     start: 4,
///     end: 6,
///     path: "id".to_string(),
///     field_name: "id".to_string(),
///     type_label: "int32".to_string(),
///     wire_type: WireType::Varint,
///     depth: 0,
///     value: DecodedValue::Scalar(ScalarValue::I32(7)),
/// };
/// assert!(region.contains(5));
/// assert!(!region.contains(6));
/// assert_eq!(region.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ByteRegion {
    /// First byte of the field's tag.
    pub start: usize,
    /// One past the field's last byte.
    pub end: usize,
    /// Dotted/bracketed path of the field in the value tree.
    pub path: String,
    pub field_name: String,
    /// Declared type name, `packed <type>` for packed blocks, or `unknown`.
    pub type_label: String,
    pub wire_type: WireType,
    /// Nesting depth; root message fields are at depth 0.
    pub depth: usize,
    pub value: DecodedValue,
}

impl ByteRegion {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, byte_index: usize) -> bool {
        self.start <= byte_index && byte_index < self.end
    }
}
