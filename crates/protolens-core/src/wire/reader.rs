use super::error::WireError;
use super::layout;
use super::WireType;

/// Cursor over one immutable buffer.
///
/// There is exactly one reader per decode; recursive message decoding shares
/// it by `&mut`, so `position()` is always an absolute buffer offset.
///
/// # Examples
/// ```
/// use protolens_core::wire::WireReader;
///
/// let bytes = [0x96, 0x01, 0x02, b'h', b'i'];
/// let mut reader = WireReader::new(&bytes);
/// assert_eq!(reader.read_varint()?, 150);
/// let (len, body) = reader.read_length_delimited()?;
/// assert_eq!((len, body), (2, &b"hi"[..]));
/// assert_eq!(reader.position(), 5);
/// # Ok::<(), protolens_core::wire::WireError>(())
/// ```
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current absolute offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn require(&self, needed: usize) -> Result<(), WireError> {
        if self.remaining() < needed {
            return Err(WireError::OutOfBounds {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let start = self.pos;
        let mut value = 0u64;
        for index in 0..layout::MAX_VARINT_LEN {
            let byte = *self.buf.get(start + index).ok_or(WireError::OutOfBounds {
                offset: start,
                needed: index + 1,
                available: self.buf.len() - start,
            })?;
            let shift = index as u32 * layout::VARINT_GROUP_BITS;
            value |= u64::from(byte & layout::VARINT_PAYLOAD_MASK) << shift;
            if byte & layout::VARINT_CONTINUATION == 0 {
                self.pos = start + index + 1;
                return Ok(value);
            }
        }
        Err(WireError::VarintOverflow { offset: start })
    }

    pub fn read_fixed32(&mut self) -> Result<[u8; layout::FIXED32_LEN], WireError> {
        let bytes = self.take(layout::FIXED32_LEN)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn read_fixed64(&mut self) -> Result<[u8; layout::FIXED64_LEN], WireError> {
        let bytes = self.take(layout::FIXED64_LEN)?;
        let mut out = [0u8; layout::FIXED64_LEN];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read a length prefix and check that the body fits in the buffer.
    ///
    /// The cursor is left at the first body byte, so the body ends at
    /// `position() + length`.
    pub fn read_length(&mut self) -> Result<usize, WireError> {
        let raw = self.read_varint()?;
        let length = usize::try_from(raw).unwrap_or(usize::MAX);
        self.require(length)?;
        Ok(length)
    }

    pub fn read_length_delimited(&mut self) -> Result<(usize, &'a [u8]), WireError> {
        let length = self.read_length()?;
        let body = self.take(length)?;
        Ok((length, body))
    }

    /// Read a tag and split it into field number and wire type.
    ///
    /// # Errors
    /// Returns `WireError` when the varint is truncated, the wire type code is
    /// reserved, or the field number does not fit the format's 29-bit range.
    pub fn read_tag(&mut self) -> Result<(u32, WireType), WireError> {
        let offset = self.pos;
        let tag = self.read_varint()?;
        let wire_type = WireType::from_code((tag & layout::TAG_TYPE_MASK) as u8, offset)?;
        let number = tag >> layout::TAG_TYPE_BITS;
        let field_number = u32::try_from(number)
            .ok()
            .filter(|n| *n <= layout::MAX_FIELD_NUMBER)
            .ok_or(WireError::InvalidFieldNumber {
                offset,
                value: number,
            })?;
        Ok((field_number, wire_type))
    }

    /// Advance past one value of `wire_type` without materializing it.
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), WireError> {
        match wire_type {
            WireType::Varint => self.read_varint().map(|_| ()),
            WireType::Fixed64 => self.take(layout::FIXED64_LEN).map(|_| ()),
            WireType::LengthDelimited => self.read_length_delimited().map(|_| ()),
            WireType::Fixed32 => self.take(layout::FIXED32_LEN).map(|_| ()),
            WireType::StartGroup | WireType::EndGroup => Err(WireError::UnsupportedWireType {
                offset: self.pos,
                wire_type,
            }),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        self.require(n)?;
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::WireReader;
    use crate::wire::{WireError, WireType};

    #[test]
    fn reads_single_and_multi_byte_varints() {
        let bytes = [0x07, 0xac, 0x02];
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_varint().unwrap(), 7);
        assert_eq!(reader.read_varint().unwrap(), 300);
        assert_eq!(reader.position(), 3);
    }

    #[test]
    fn reads_max_u64_varint() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_varint().unwrap(), u64::MAX);
    }

    #[test]
    fn truncated_varint_is_out_of_bounds() {
        let bytes = [0x80, 0x80];
        let mut reader = WireReader::new(&bytes);
        let err = reader.read_varint().unwrap_err();
        assert_eq!(
            err,
            WireError::OutOfBounds {
                offset: 0,
                needed: 3,
                available: 2
            }
        );
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn overlong_varint_is_rejected() {
        let bytes = [0xff; 11];
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            reader.read_varint(),
            Err(WireError::VarintOverflow { offset: 0 })
        ));
    }

    #[test]
    fn fixed_reads_need_full_width() {
        let bytes = [1, 2, 3, 4, 5];
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_fixed32().unwrap(), [1, 2, 3, 4]);
        let err = reader.read_fixed64().unwrap_err();
        assert!(matches!(err, WireError::OutOfBounds { offset: 4, .. }));
    }

    #[test]
    fn length_beyond_buffer_is_out_of_bounds() {
        let bytes = [0x05, b'a', b'b'];
        let mut reader = WireReader::new(&bytes);
        let err = reader.read_length_delimited().unwrap_err();
        assert_eq!(
            err,
            WireError::OutOfBounds {
                offset: 1,
                needed: 5,
                available: 2
            }
        );
    }

    #[test]
    fn read_tag_splits_number_and_wire_type() {
        let bytes = [0xf8, 0x06];
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_tag().unwrap(), (111, WireType::Varint));
    }

    #[test]
    fn read_tag_rejects_reserved_wire_type() {
        let bytes = [0x0f];
        let mut reader = WireReader::new(&bytes);
        assert!(matches!(
            reader.read_tag(),
            Err(WireError::InvalidWireType { code: 7, .. })
        ));
    }

    #[test]
    fn skip_advances_by_wire_type() {
        let bytes = [
            0x96, 0x01, // varint
            1, 2, 3, 4, 5, 6, 7, 8, // fixed64
            0x02, b'o', b'k', // length-delimited
            9, 9, 9, 9, // fixed32
        ];
        let mut reader = WireReader::new(&bytes);
        reader.skip(WireType::Varint).unwrap();
        assert_eq!(reader.position(), 2);
        reader.skip(WireType::Fixed64).unwrap();
        assert_eq!(reader.position(), 10);
        reader.skip(WireType::LengthDelimited).unwrap();
        assert_eq!(reader.position(), 13);
        reader.skip(WireType::Fixed32).unwrap();
        assert_eq!(reader.position(), bytes.len());
    }

    #[test]
    fn skip_rejects_groups() {
        let bytes = [0x00];
        let mut reader = WireReader::new(&bytes);
        let err = reader.skip(WireType::StartGroup).unwrap_err();
        assert!(matches!(err, WireError::UnsupportedWireType { .. }));
    }
}
