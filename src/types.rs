pub const MQTT: &[u8] = b"MQTT";
pub const MQTT_LEVEL_3: u8 = 4;
pub(crate) const WILL_QOS_SHIFT: u8 = 3;

prim_enum! {
    /// Quality of Service
    pub enum QoS {
        /// At most once delivery
        ///
        /// The message is delivered according to the capabilities of the underlying network.
        /// No response is sent by the receiver and no retry is performed by the sender.
        /// The message arrives at the receiver either once or not at all.
        AtMostOnce = 0,
        /// At least once delivery
        ///
        /// This quality of service ensures that the message arrives at the receiver at least once.
        /// A QoS 1 PUBLISH Packet has a Packet Identifier in its variable header
        /// and is acknowledged by a PUBACK Packet.
        AtLeastOnce = 1,
        /// Exactly once delivery
        ///
        /// This is the highest quality of service,
        /// for use when neither loss nor duplication of messages are acceptable.
        /// There is an increased overhead associated with this quality of service.
        ExactlyOnce = 2
    }
}

prim_enum! {
    /// Control packet type, the high nibble of the first fixed header byte
    pub enum PacketType {
        Connect = 1,
        ConnectAck = 2,
        Publish = 3,
        PublishAck = 4,
        PublishReceived = 5,
        PublishRelease = 6,
        PublishComplete = 7,
        Subscribe = 8,
        SubscribeAck = 9,
        Unsubscribe = 10,
        UnsubscribeAck = 11,
        PingRequest = 12,
        PingResponse = 13,
        Disconnect = 14
    }
}

impl PacketType {
    /// Flags MQTT v3.1.1 mandates for this packet type.
    ///
    /// Publish flags vary per message, zero is returned for them.
    pub fn default_flags(self) -> u8 {
        match self {
            PacketType::PublishRelease | PacketType::Subscribe | PacketType::Unsubscribe => {
                0b0010
            }
            _ => 0,
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct ConnectFlags: u8 {
        const USERNAME      = 0b1000_0000;
        const PASSWORD      = 0b0100_0000;
        const WILL_RETAIN   = 0b0010_0000;
        const WILL_QOS      = 0b0001_1000;
        const WILL          = 0b0000_0100;
        const CLEAN_SESSION = 0b0000_0010;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn test_packet_type() {
        assert_eq!(PacketType::try_from(1), Ok(PacketType::Connect));
        assert_eq!(PacketType::try_from(8), Ok(PacketType::Subscribe));
        assert_eq!(PacketType::try_from(0), Err(DecodeError::MalformedPacket));
        assert_eq!(PacketType::try_from(15), Err(DecodeError::MalformedPacket));
        assert_eq!(u8::from(PacketType::Disconnect), 14);

        assert_eq!(PacketType::Connect.default_flags(), 0);
        assert_eq!(PacketType::Subscribe.default_flags(), 0b0010);
    }

    #[test]
    fn test_qos() {
        assert_eq!(QoS::try_from(2), Ok(QoS::ExactlyOnce));
        assert_eq!(QoS::try_from(3), Err(DecodeError::MalformedPacket));
        assert_eq!(u8::from(QoS::AtLeastOnce), 1);
    }

    #[test]
    fn test_connect_flags_reserved_bit() {
        assert!(ConnectFlags::from_bits(0b1111_1110).is_some());
        assert!(ConnectFlags::from_bits(0b0000_0001).is_none());
    }
}
