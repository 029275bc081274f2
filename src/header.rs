use ntex_bytes::{BufMut, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::types::PacketType;
use crate::utils::{decode_variable_length, var_int_len, write_variable_length};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Fixed header, present in every control packet
pub struct FixedHeader {
    pub packet_type: PacketType,
    /// packet type specific flags, low nibble of the first byte
    pub flags: u8,
    /// the number of bytes remaining within the current packet,
    /// including data in the variable header and the payload.
    pub remaining_length: u32,
}

impl FixedHeader {
    pub fn new(packet_type: PacketType, remaining_length: u32) -> Self {
        FixedHeader { packet_type, flags: packet_type.default_flags(), remaining_length }
    }

    /// The first byte of the packet, type and flags packed together
    pub fn first_byte(&self) -> u8 {
        (u8::from(self.packet_type) << 4) | (self.flags & 0b0000_1111)
    }

    /// Size of the encoded fixed header
    pub fn encoded_size(&self) -> usize {
        1 + var_int_len(self.remaining_length)
    }

    /// Size of the whole packet, header included
    pub fn frame_size(&self) -> usize {
        self.encoded_size() + self.remaining_length as usize
    }

    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        log::trace!(
            "write FixedHeader {{ type={:?}, flags={:#06b}, remaining_length={} }}",
            self.packet_type,
            self.flags,
            self.remaining_length
        );
        dst.reserve(self.encoded_size());
        dst.put_u8(self.first_byte());
        write_variable_length(self.remaining_length, dst)
    }

    /// Decodes the fixed header at the start of `src`.
    ///
    /// Returns the header and the number of bytes it occupies.
    pub fn decode(src: &[u8]) -> Result<(FixedHeader, usize), DecodeError> {
        FixedHeader::parse(src)?.ok_or(DecodeError::InvalidLength)
    }

    /// Same as `decode`, but `Ok(None)` if `src` ends inside the header.
    pub(crate) fn parse(src: &[u8]) -> Result<Option<(FixedHeader, usize)>, DecodeError> {
        let Some(&first_byte) = src.first() else {
            return Ok(None);
        };
        let packet_type =
            PacketType::try_from(first_byte >> 4).map_err(|_| DecodeError::UnsupportedPacketType)?;
        Ok(decode_variable_length(&src[1..])?.map(|(remaining_length, consumed)| {
            let header =
                FixedHeader { packet_type, flags: first_byte & 0b0000_1111, remaining_length };
            (header, consumed + 1)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_decode_fixed_header() {
        assert_eq!(
            FixedHeader::decode(b"\x20\x7f"),
            Ok((
                FixedHeader {
                    packet_type: PacketType::ConnectAck,
                    flags: 0,
                    remaining_length: 127
                },
                2
            ))
        );
        assert_eq!(
            FixedHeader::decode(b"\x3C\x82\x7f"),
            Ok((
                FixedHeader {
                    packet_type: PacketType::Publish,
                    flags: 0x0C,
                    remaining_length: (0x7F << 7) + 2,
                },
                3
            ))
        );
        assert_eq!(
            FixedHeader::decode(b"\x15\x0e\x00\x04"),
            Ok((
                FixedHeader { packet_type: PacketType::Connect, flags: 5, remaining_length: 14 },
                2
            ))
        );
    }

    #[test_case(b"" ; "empty")]
    #[test_case(b"\x10" ; "missing length")]
    #[test_case(b"\x10\x80\x80" ; "truncated length")]
    #[test_case(b"\x10\xff\xff\xff\xff" ; "four continuation bytes")]
    #[test_case(b"\x10\xff\xff\xff\xff\x01" ; "five length bytes")]
    fn test_decode_invalid_length(src: &[u8]) {
        assert_eq!(FixedHeader::decode(src), Err(DecodeError::InvalidLength));
    }

    #[test_case(b"\x00\x00" ; "reserved zero")]
    #[test_case(b"\xf0\x00" ; "reserved fifteen")]
    fn test_decode_reserved_type(src: &[u8]) {
        assert_eq!(FixedHeader::decode(src), Err(DecodeError::UnsupportedPacketType));
    }

    #[test_case(PacketType::Connect, 12, b"\x10\x0c")]
    #[test_case(PacketType::Subscribe, 127, b"\x82\x7f")]
    #[test_case(PacketType::Subscribe, 128, b"\x82\x80\x01")]
    #[test_case(PacketType::PingRequest, 0, b"\xc0\x00")]
    #[test_case(PacketType::Connect, 268_435_455, b"\x10\xff\xff\xff\x7f")]
    fn test_encode_fixed_header(packet_type: PacketType, len: u32, expected: &[u8]) {
        let header = FixedHeader::new(packet_type, len);
        let mut v = BytesMut::new();
        header.encode(&mut v).unwrap();
        assert_eq!(v.as_ref(), expected);
        assert_eq!(header.encoded_size(), expected.len());
        assert_eq!(FixedHeader::decode(expected), Ok((header, expected.len())));
    }

    #[test]
    fn test_encode_oversized() {
        let header = FixedHeader::new(PacketType::Connect, 268_435_456);
        assert_eq!(header.encode(&mut BytesMut::new()), Err(EncodeError::OverMaxPacketSize));
    }

    #[test]
    fn test_first_byte_masks_flags() {
        let header =
            FixedHeader { packet_type: PacketType::Connect, flags: 0xff, remaining_length: 0 };
        assert_eq!(header.first_byte(), 0x1f);
    }
}
