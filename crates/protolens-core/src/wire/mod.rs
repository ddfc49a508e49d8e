//! Wire-format primitives.
//!
//! The module follows the layered structure used throughout the crate:
//! - `layout`: tag bit layout, wire type codes and fixed widths
//! - `reader`: cursor-based primitive reads over one shared buffer
//! - `error`: explicit, offset-carrying errors
//!
//! The reader has no schema knowledge. All offsets it reports are absolute
//! positions in the buffer it was created with; nested messages are read in
//! place by the same reader, never through a sliced copy.

use std::fmt;

use serde::{Serialize, Serializer};

pub mod error;
pub mod layout;
pub mod reader;

pub use error::WireError;
pub use reader::WireReader;

/// Framing of a single field occurrence, taken from the low three tag bits.
///
/// # Examples
/// ```
/// use protolens_core::wire::WireType;
///
/// assert_eq!(WireType::from_code(2, 0).unwrap(), WireType::LengthDelimited);
/// assert_eq!(WireType::Fixed32.code(), 5);
/// assert!(WireType::from_code(7, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    StartGroup,
    EndGroup,
    Fixed32,
}

impl WireType {
    /// Map a 3-bit code to a wire type; `offset` is only used for the error.
    pub fn from_code(code: u8, offset: usize) -> Result<Self, WireError> {
        match code {
            layout::WIRE_VARINT => Ok(WireType::Varint),
            layout::WIRE_FIXED64 => Ok(WireType::Fixed64),
            layout::WIRE_LENGTH_DELIMITED => Ok(WireType::LengthDelimited),
            layout::WIRE_START_GROUP => Ok(WireType::StartGroup),
            layout::WIRE_END_GROUP => Ok(WireType::EndGroup),
            layout::WIRE_FIXED32 => Ok(WireType::Fixed32),
            _ => Err(WireError::InvalidWireType { offset, code }),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            WireType::Varint => layout::WIRE_VARINT,
            WireType::Fixed64 => layout::WIRE_FIXED64,
            WireType::LengthDelimited => layout::WIRE_LENGTH_DELIMITED,
            WireType::StartGroup => layout::WIRE_START_GROUP,
            WireType::EndGroup => layout::WIRE_END_GROUP,
            WireType::Fixed32 => layout::WIRE_FIXED32,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "64-bit",
            WireType::LengthDelimited => "length-delimited",
            WireType::StartGroup => "start-group",
            WireType::EndGroup => "end-group",
            WireType::Fixed32 => "32-bit",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

impl Serialize for WireType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::{WireError, WireType};

    #[test]
    fn codes_round_trip_for_known_types() {
        for code in 0..=5u8 {
            let wire_type = WireType::from_code(code, 0).unwrap();
            assert_eq!(wire_type.code(), code);
        }
    }

    #[test]
    fn rejects_reserved_codes() {
        let err = WireType::from_code(6, 12).unwrap_err();
        assert_eq!(err, WireError::InvalidWireType { offset: 12, code: 6 });
    }

    #[test]
    fn serializes_as_numeric_code() {
        let json = serde_json::to_string(&WireType::Fixed32).unwrap();
        assert_eq!(json, "5");
    }
}
