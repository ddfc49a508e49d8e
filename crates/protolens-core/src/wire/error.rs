use thiserror::Error;

use super::WireType;

/// Errors returned by the wire reader.
///
/// Every variant carries the absolute offset at which the failing read
/// started.
///
/// # Examples
/// ```
/// use protolens_core::wire::WireError;
///
/// let err = WireError::OutOfBounds { offset: 4, needed: 8, available: 2 };
/// assert!(err.to_string().contains("need 8 bytes, got 2"));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("read past end of buffer at offset {offset}: need {needed} bytes, got {available}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("varint at offset {offset} is longer than 10 bytes")]
    VarintOverflow { offset: usize },
    #[error("invalid wire type {code} at offset {offset}")]
    InvalidWireType { offset: usize, code: u8 },
    #[error("unsupported wire type {wire_type} at offset {offset}")]
    UnsupportedWireType { offset: usize, wire_type: WireType },
    #[error("invalid field number {value} at offset {offset}")]
    InvalidFieldNumber { offset: usize, value: u64 },
}

impl WireError {
    /// Absolute offset of the read that failed.
    pub fn offset(&self) -> usize {
        match self {
            WireError::OutOfBounds { offset, .. }
            | WireError::VarintOverflow { offset }
            | WireError::InvalidWireType { offset, .. }
            | WireError::UnsupportedWireType { offset, .. }
            | WireError::InvalidFieldNumber { offset, .. } => *offset,
        }
    }
}
