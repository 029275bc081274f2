use ntex_bytes::{Buf, Bytes, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::header::FixedHeader;
use crate::types::PacketType;

mod connect;
mod subscribe;

pub use self::connect::{Connect, LastWill, VARIABLE_HEADER_SIZE};
pub use self::subscribe::{Subscribe, TopicFilter};

#[derive(Debug, PartialEq, Eq, Clone)]
/// MQTT Control Packets
pub enum Packet {
    /// Client request to connect to Server
    Connect(Box<Connect>),
    /// Client subscribe request
    Subscribe(Subscribe),
}

impl From<Connect> for Packet {
    fn from(val: Connect) -> Packet {
        Packet::Connect(Box::new(val))
    }
}

impl From<Subscribe> for Packet {
    fn from(val: Subscribe) -> Packet {
        Packet::Subscribe(val)
    }
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Connect(pkt) => pkt.packet_type(),
            Packet::Subscribe(pkt) => pkt.packet_type(),
        }
    }

    /// Fixed header of the encoded packet, remaining length included
    pub fn fixed_header(&self) -> Result<FixedHeader, EncodeError> {
        match self {
            Packet::Connect(pkt) => pkt.fixed_header(),
            Packet::Subscribe(pkt) => pkt.fixed_header(),
        }
    }

    pub fn encode_to(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        match self {
            Packet::Connect(pkt) => pkt.encode_to(dst),
            Packet::Subscribe(pkt) => pkt.encode_to(dst),
        }
    }

    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut dst = BytesMut::new();
        self.encode_to(&mut dst)?;
        Ok(dst.freeze())
    }

    /// Reads the fixed header of `src` and decodes the packet it announces.
    pub fn decode(src: &[u8]) -> Result<Packet, DecodeError> {
        let (header, _) = FixedHeader::decode(src)?;
        match header.packet_type {
            PacketType::Connect => Ok(Connect::decode(src)?.into()),
            PacketType::Subscribe => Ok(Subscribe::decode(src)?.into()),
            _ => Err(DecodeError::UnsupportedPacketType),
        }
    }

    /// Decodes a frame body, `src` holds exactly `header.remaining_length` bytes.
    pub(crate) fn decode_frame(header: FixedHeader, mut src: Bytes) -> Result<Packet, DecodeError> {
        match header.packet_type {
            PacketType::Connect => {
                let connect = Connect::decode_body(&mut src)?;
                ensure!(!src.has_remaining(), DecodeError::InvalidLength);
                Ok(connect.into())
            }
            PacketType::Subscribe => Ok(Subscribe::decode_body(src)?.into()),
            _ => Err(DecodeError::UnsupportedPacketType),
        }
    }
}
