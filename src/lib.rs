//! MQTT v3.1.1 control packet codec
//!
//! Encodes and decodes the fixed header, CONNECT and SUBSCRIBE packets.
//! `Codec` frames a byte stream for `ntex-codec` based transports.
#![deny(rust_2018_idioms, unreachable_pub)]

#[macro_use]
mod utils;

mod codec;
mod config;
mod error;
mod header;
mod packet;
mod types;

pub use self::codec::Codec;
pub use self::config::CodecConfig;
pub use self::error::{DecodeError, EncodeError, ProtocolName};
pub use self::header::FixedHeader;
pub use self::packet::{
    Connect, LastWill, Packet, Subscribe, TopicFilter, VARIABLE_HEADER_SIZE,
};
pub use self::types::{ConnectFlags, PacketType, QoS, MQTT, MQTT_LEVEL_3};
pub use self::utils::{
    decode_utf8_str, decode_variable_length, encode_utf8_str, MAX_VARIABLE_LENGTH,
};
