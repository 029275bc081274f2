use std::fmt;

/// Protocol name bytes found where `MQTT` was expected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolName {
    /// declared length of the protocol name
    pub len: u16,
    /// the four bytes following the length
    pub name: [u8; 4],
}

impl fmt::Display for ProtocolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "length {} name \"{}\"", self.len, self.name.escape_ascii())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid protocol identifier: {0}")]
    InvalidProtocol(ProtocolName),
    #[error("Invalid length")]
    InvalidLength,
    #[error("Missing packet identifier")]
    MissingPacketId,
    #[error("Malformed packet")]
    MalformedPacket,
    #[error("Unsupported protocol level: {0}")]
    UnsupportedProtocolLevel(u8),
    #[error("Connect frame's reserved flag is set")]
    ConnectReservedFlagSet,
    #[error("Unsupported packet type")]
    UnsupportedPacketType,
    #[error("Max size exceeded")]
    MaxSizeExceeded,
    #[error("utf8 error")]
    Utf8Error,
}

impl DecodeError {
    /// `true` for errors caused by a non-`MQTT` protocol name.
    ///
    /// Every other variant describes a malformed frame.
    pub fn is_protocol_identifier(&self) -> bool {
        matches!(self, DecodeError::InvalidProtocol(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum EncodeError {
    /// String or binary field longer than 65535 bytes
    #[error("Invalid length")]
    InvalidLength,
    #[error("Over max packet size")]
    OverMaxPacketSize,
    #[error("Malformed packet")]
    MalformedPacket,
    #[error("Unsupported version")]
    UnsupportedVersion,
}
