use crate::decode::ScalarValue;
use crate::wire::{WireError, WireReader, WireType};

/// Closed set of scalar field types, resolved once when a schema is bound.
///
/// # Examples
/// ```
/// use protolens_core::schema::ScalarKind;
/// use protolens_core::wire::WireType;
///
/// let kind = ScalarKind::from_type_name("sint64").unwrap();
/// assert_eq!(kind.wire_type(), WireType::Varint);
/// assert!(ScalarKind::from_type_name("Address").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarKind {
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name {
            "double" => ScalarKind::Double,
            "float" => ScalarKind::Float,
            "int32" => ScalarKind::Int32,
            "int64" => ScalarKind::Int64,
            "uint32" => ScalarKind::Uint32,
            "uint64" => ScalarKind::Uint64,
            "sint32" => ScalarKind::Sint32,
            "sint64" => ScalarKind::Sint64,
            "fixed32" => ScalarKind::Fixed32,
            "fixed64" => ScalarKind::Fixed64,
            "sfixed32" => ScalarKind::Sfixed32,
            "sfixed64" => ScalarKind::Sfixed64,
            "bool" => ScalarKind::Bool,
            "string" => ScalarKind::String,
            "bytes" => ScalarKind::Bytes,
            _ => return None,
        };
        Some(kind)
    }

    pub fn type_name(self) -> &'static str {
        match self {
            ScalarKind::Double => "double",
            ScalarKind::Float => "float",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Sint32 => "sint32",
            ScalarKind::Sint64 => "sint64",
            ScalarKind::Fixed32 => "fixed32",
            ScalarKind::Fixed64 => "fixed64",
            ScalarKind::Sfixed32 => "sfixed32",
            ScalarKind::Sfixed64 => "sfixed64",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "string",
            ScalarKind::Bytes => "bytes",
        }
    }

    /// Wire type a single (unpacked) value of this kind is framed with.
    pub fn wire_type(self) -> WireType {
        match self {
            ScalarKind::Double | ScalarKind::Fixed64 | ScalarKind::Sfixed64 => WireType::Fixed64,
            ScalarKind::Float | ScalarKind::Fixed32 | ScalarKind::Sfixed32 => WireType::Fixed32,
            ScalarKind::String | ScalarKind::Bytes => WireType::LengthDelimited,
            ScalarKind::Int32
            | ScalarKind::Int64
            | ScalarKind::Uint32
            | ScalarKind::Uint64
            | ScalarKind::Sint32
            | ScalarKind::Sint64
            | ScalarKind::Bool => WireType::Varint,
        }
    }

    /// Whether repeated values of this kind may be packed into one block.
    pub fn is_packable(self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    /// Decode one value of this kind at the reader's cursor.
    pub fn read(self, reader: &mut WireReader<'_>) -> Result<ScalarValue, WireError> {
        let value = match self {
            ScalarKind::Double => ScalarValue::F64(f64::from_le_bytes(reader.read_fixed64()?)),
            ScalarKind::Float => ScalarValue::F32(f32::from_le_bytes(reader.read_fixed32()?)),
            ScalarKind::Int32 => ScalarValue::I32(reader.read_varint()? as i32),
            ScalarKind::Int64 => ScalarValue::I64(reader.read_varint()? as i64),
            ScalarKind::Uint32 => ScalarValue::U32(reader.read_varint()? as u32),
            ScalarKind::Uint64 => ScalarValue::U64(reader.read_varint()?),
            ScalarKind::Sint32 => ScalarValue::I32(zigzag_decode(reader.read_varint()?) as i32),
            ScalarKind::Sint64 => ScalarValue::I64(zigzag_decode(reader.read_varint()?)),
            ScalarKind::Fixed32 => ScalarValue::U32(u32::from_le_bytes(reader.read_fixed32()?)),
            ScalarKind::Fixed64 => ScalarValue::U64(u64::from_le_bytes(reader.read_fixed64()?)),
            ScalarKind::Sfixed32 => ScalarValue::I32(i32::from_le_bytes(reader.read_fixed32()?)),
            ScalarKind::Sfixed64 => ScalarValue::I64(i64::from_le_bytes(reader.read_fixed64()?)),
            ScalarKind::Bool => ScalarValue::Bool(reader.read_varint()? != 0),
            ScalarKind::String => {
                let (_, body) = reader.read_length_delimited()?;
                ScalarValue::String(String::from_utf8_lossy(body).into_owned())
            }
            ScalarKind::Bytes => {
                let (_, body) = reader.read_length_delimited()?;
                ScalarValue::Bytes(body.to_vec())
            }
        };
        Ok(value)
    }
}

fn zigzag_decode(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::{ScalarKind, zigzag_decode};
    use crate::decode::ScalarValue;
    use crate::wire::WireReader;

    #[test]
    fn type_names_round_trip() {
        for name in [
            "double", "float", "int32", "int64", "uint32", "uint64", "sint32", "sint64",
            "fixed32", "fixed64", "sfixed32", "sfixed64", "bool", "string", "bytes",
        ] {
            let kind = ScalarKind::from_type_name(name).unwrap();
            assert_eq!(kind.type_name(), name);
        }
    }

    #[test]
    fn zigzag_maps_small_magnitudes() {
        assert_eq!(zigzag_decode(0), 0);
        assert_eq!(zigzag_decode(1), -1);
        assert_eq!(zigzag_decode(2), 1);
        assert_eq!(zigzag_decode(5), -3);
        assert_eq!(zigzag_decode(u64::MAX), i64::MIN);
    }

    #[test]
    fn negative_int32_uses_ten_byte_varint() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        let mut reader = WireReader::new(&bytes);
        let value = ScalarKind::Int32.read(&mut reader).unwrap();
        assert_eq!(value, ScalarValue::I32(-1));
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn reads_fixed_width_floats() {
        let bytes = 1.5f64.to_le_bytes();
        let mut reader = WireReader::new(&bytes);
        assert_eq!(
            ScalarKind::Double.read(&mut reader).unwrap(),
            ScalarValue::F64(1.5)
        );
    }

    #[test]
    fn strings_and_bytes_are_not_packable() {
        assert!(!ScalarKind::String.is_packable());
        assert!(!ScalarKind::Bytes.is_packable());
        assert!(ScalarKind::Sfixed32.is_packable());
    }
}
