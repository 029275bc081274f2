use ntex_bytes::{Buf, BufMut, ByteString, Bytes, BytesMut};

use crate::error::{DecodeError, EncodeError};

macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            return Err($e);
        }
    };
}

macro_rules! prim_enum {
    (
        $( #[$enum_attr:meta] )*
        pub enum $name:ident {
            $(
                $( #[$enum_item_attr:meta] )*
                $var:ident=$val:expr
            ),+
        }) => {
        $( #[$enum_attr] )*
        #[repr(u8)]
        #[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
        pub enum $name {
            $(
                $( #[$enum_item_attr] )*
                $var = $val
            ),+
        }
        impl std::convert::TryFrom<u8> for $name {
            type Error = $crate::error::DecodeError;
            fn try_from(v: u8) -> Result<Self, Self::Error> {
                match v {
                    $($val => Ok($name::$var)),+
                    ,_ => Err($crate::error::DecodeError::MalformedPacket)
                }
            }
        }
        impl From<$name> for u8 {
            fn from(v: $name) -> Self {
                v as u8
            }
        }
    };
}

/// Largest value the remaining length field can carry (`0xFF,0xFF,0xFF,0x7F`).
pub const MAX_VARIABLE_LENGTH: u32 = 268_435_455;

pub(crate) trait Decode: Sized {
    fn decode(src: &mut Bytes) -> Result<Self, DecodeError>;
}

pub(crate) trait Encode {
    fn encoded_size(&self) -> usize;

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError>;
}

/// Decodes variable length and returns tuple of (length, bytes consumed).
///
/// Returns `Ok(None)` if `src` ends before the last length byte.
pub fn decode_variable_length(src: &[u8]) -> Result<Option<(u32, usize)>, DecodeError> {
    let mut len: u32 = 0;
    for (idx, byte) in src.iter().enumerate() {
        ensure!(idx < 4, DecodeError::InvalidLength);
        len += u32::from(byte & 0b0111_1111) << (idx * 7);
        if byte & 0b1000_0000 == 0 {
            return Ok(Some((len, idx + 1)));
        }
    }
    // fourth byte still had the continuation bit set
    ensure!(src.len() < 4, DecodeError::InvalidLength);
    Ok(None)
}

/// Number of bytes `write_variable_length` emits for `len`.
pub(crate) fn var_int_len(len: u32) -> usize {
    match len {
        0..=127 => 1,
        128..=16_383 => 2,
        16_384..=2_097_151 => 3,
        _ => 4,
    }
}

pub(crate) fn write_variable_length(len: u32, dst: &mut BytesMut) -> Result<(), EncodeError> {
    match len {
        0..=127 => dst.put_u8(len as u8),
        128..=16_383 => {
            dst.put_slice(&[((len & 0b0111_1111) | 0b1000_0000) as u8, (len >> 7) as u8])
        }
        16_384..=2_097_151 => {
            dst.put_slice(&[
                ((len & 0b0111_1111) | 0b1000_0000) as u8,
                (((len >> 7) & 0b0111_1111) | 0b1000_0000) as u8,
                (len >> 14) as u8,
            ]);
        }
        2_097_152..=MAX_VARIABLE_LENGTH => {
            dst.put_slice(&[
                ((len & 0b0111_1111) | 0b1000_0000) as u8,
                (((len >> 7) & 0b0111_1111) | 0b1000_0000) as u8,
                (((len >> 14) & 0b0111_1111) | 0b1000_0000) as u8,
                (len >> 21) as u8,
            ]);
        }
        _ => return Err(EncodeError::OverMaxPacketSize),
    }
    Ok(())
}

/// Encodes `s` as a length-prefixed string.
///
/// Fails with `EncodeError::InvalidLength` if `s` is longer than 65535 bytes.
pub fn encode_utf8_str(s: &str) -> Result<Bytes, EncodeError> {
    let mut buf = BytesMut::with_capacity(2 + s.len());
    write_length_bytes(s.as_bytes(), &mut buf)?;
    Ok(buf.freeze())
}

/// Decodes a length-prefixed string from the start of `src`.
///
/// Returns the string and the position right after it.
pub fn decode_utf8_str(src: &[u8]) -> Result<(ByteString, usize), DecodeError> {
    let mut buf = Bytes::copy_from_slice(src);
    let s = ByteString::decode(&mut buf)?;
    Ok((s, src.len() - buf.remaining()))
}

fn write_length_bytes(s: &[u8], dst: &mut BytesMut) -> Result<(), EncodeError> {
    let len = u16::try_from(s.len()).map_err(|_| EncodeError::InvalidLength)?;
    dst.put_u16(len);
    dst.extend_from_slice(s);
    Ok(())
}

impl Decode for u8 {
    fn decode(src: &mut Bytes) -> Result<Self, DecodeError> {
        ensure!(src.has_remaining(), DecodeError::InvalidLength);
        Ok(src.get_u8())
    }
}

impl Decode for u16 {
    fn decode(src: &mut Bytes) -> Result<Self, DecodeError> {
        ensure!(src.remaining() >= 2, DecodeError::InvalidLength);
        Ok(src.get_u16())
    }
}

impl Decode for Bytes {
    fn decode(src: &mut Bytes) -> Result<Self, DecodeError> {
        let len = u16::decode(src)? as usize;
        ensure!(src.remaining() >= len, DecodeError::InvalidLength);
        Ok(src.split_to(len))
    }
}

impl Decode for ByteString {
    fn decode(src: &mut Bytes) -> Result<Self, DecodeError> {
        let bytes = Bytes::decode(src)?;
        ByteString::try_from(bytes).map_err(|_| DecodeError::Utf8Error)
    }
}

impl Encode for u16 {
    fn encoded_size(&self) -> usize {
        2
    }
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        buf.put_u16(*self);
        Ok(())
    }
}

impl Encode for Bytes {
    fn encoded_size(&self) -> usize {
        2 + self.len()
    }
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_length_bytes(self.as_ref(), buf)
    }
}

impl Encode for ByteString {
    fn encoded_size(&self) -> usize {
        2 + self.len()
    }
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        write_length_bytes(self.as_bytes(), buf)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encoded_size(&self) -> usize {
        self.as_ref().map_or(0, Encode::encoded_size)
    }
    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        if let Some(v) = self {
            v.encode(buf)
        } else {
            Ok(())
        }
    }
}
