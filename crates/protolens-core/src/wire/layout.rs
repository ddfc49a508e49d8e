pub const TAG_TYPE_BITS: u32 = 3;
pub const TAG_TYPE_MASK: u64 = 0x07;

pub const VARINT_CONTINUATION: u8 = 0x80;
pub const VARINT_PAYLOAD_MASK: u8 = 0x7f;
pub const VARINT_GROUP_BITS: u32 = 7;
pub const MAX_VARINT_LEN: usize = 10;

pub const FIXED32_LEN: usize = 4;
pub const FIXED64_LEN: usize = 8;

pub const WIRE_VARINT: u8 = 0;
pub const WIRE_FIXED64: u8 = 1;
pub const WIRE_LENGTH_DELIMITED: u8 = 2;
pub const WIRE_START_GROUP: u8 = 3;
pub const WIRE_END_GROUP: u8 = 4;
pub const WIRE_FIXED32: u8 = 5;

pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;
