use thiserror::Error;

use crate::wire::WireError;

/// Fatal decode conditions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error("out of bounds: need {needed} bytes, got {available}")]
    OutOfBounds { needed: usize, available: usize },
    #[error("boundary mismatch: expected to end at {expected}, cursor at {actual}")]
    BoundaryMismatch { expected: usize, actual: usize },
    #[error("nesting deeper than {limit} levels")]
    DepthLimitExceeded { limit: usize },
    #[error("unknown root message type: {name}")]
    UnknownRootType { name: String },
    #[error(transparent)]
    Wire(WireError),
}

impl From<WireError> for DecodeErrorKind {
    fn from(err: WireError) -> Self {
        match err {
            WireError::OutOfBounds {
                needed, available, ..
            } => DecodeErrorKind::OutOfBounds { needed, available },
            other => DecodeErrorKind::Wire(other),
        }
    }
}

/// Top-level decode failure; no partial result accompanies it.
///
/// # Examples
/// ```
/// use protolens_core::decode::{DecodeErrorKind, DecodeFailure};
///
/// let err = DecodeFailure {
///     type_name: "demo.Person".to_string(),
///     field_number: Some(2),
///     offset: 4,
///     kind: DecodeErrorKind::OutOfBounds { needed: 1, available: 0 },
/// };
/// assert_eq!(
///     err.to_string(),
///     "failed to decode demo.Person (field 2) at offset 4: out of bounds: need 1 bytes, got 0"
/// );
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to decode {type_name}{} at offset {offset}: {kind}", field_suffix(.field_number))]
pub struct DecodeFailure {
    /// Message type being decoded when the failure occurred.
    pub type_name: String,
    /// Field being decoded, if the failure happened inside a field.
    pub field_number: Option<u32>,
    /// Absolute buffer offset of the failing read.
    pub offset: usize,
    pub kind: DecodeErrorKind,
}

fn field_suffix(field_number: &Option<u32>) -> String {
    match field_number {
        Some(number) => format!(" (field {number})"),
        None => String::new(),
    }
}
