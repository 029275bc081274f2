use ntex_bytes::{Buf, BufMut, ByteString, Bytes, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::header::FixedHeader;
use crate::types::{PacketType, QoS};
use crate::utils::{Decode, Encode, MAX_VARIABLE_LENGTH};

#[derive(Debug, PartialEq, Eq, Clone)]
/// Topic filter and the QoS requested for it
pub struct TopicFilter {
    pub filter: ByteString,
    pub qos: QoS,
}

impl TopicFilter {
    pub fn new<T>(filter: T, qos: QoS) -> Self
    where
        ByteString: From<T>,
    {
        TopicFilter { filter: filter.into(), qos }
    }
}

impl Encode for TopicFilter {
    fn encoded_size(&self) -> usize {
        self.filter.encoded_size() + 1
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodeError> {
        self.filter.encode(buf)?;
        buf.put_u8(self.qos.into());
        Ok(())
    }
}

impl Decode for TopicFilter {
    fn decode(src: &mut Bytes) -> Result<Self, DecodeError> {
        let filter = ByteString::decode(src)?;
        let qos = u8::decode(src)?;
        // upper six bits are reserved
        ensure!(qos & 0b1111_1100 == 0, DecodeError::MalformedPacket);
        Ok(TopicFilter { filter, qos: QoS::try_from(qos)? })
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
/// Subscribe packet content
pub struct Subscribe {
    /// Packet Identifier, matches the SUBACK to this request
    pub packet_id: u16,
    /// the list of Topic Filters and QoS to which the Client wants to subscribe.
    ///
    /// SUBACK return codes follow the same order.
    pub topic_filters: Vec<TopicFilter>,
}

impl Subscribe {
    pub fn new(packet_id: u16) -> Self {
        Subscribe { packet_id, topic_filters: Vec::new() }
    }

    pub fn packet_type(&self) -> PacketType {
        PacketType::Subscribe
    }

    /// Append topic filter
    pub fn topic<T>(mut self, filter: T, qos: QoS) -> Self
    where
        ByteString: From<T>,
    {
        self.add_topic(TopicFilter::new(filter, qos));
        self
    }

    pub fn add_topic(&mut self, topic: TopicFilter) {
        self.topic_filters.push(topic);
    }

    /// Fixed header of the encoded packet.
    pub fn fixed_header(&self) -> Result<FixedHeader, EncodeError> {
        let len = 2 + self.topic_filters.iter().map(Encode::encoded_size).sum::<usize>();
        ensure!(len <= MAX_VARIABLE_LENGTH as usize, EncodeError::OverMaxPacketSize);
        Ok(FixedHeader::new(PacketType::Subscribe, len as u32))
    }

    /// Appends the encoded packet to `dst`.
    ///
    /// On error `dst` is left as it was.
    pub fn encode_to(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        let start = dst.len();
        let res = self.write(dst);
        if res.is_err() {
            dst.truncate(start);
        }
        res
    }

    fn write(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        let header = self.fixed_header()?;
        dst.reserve(header.frame_size());
        header.encode(dst)?;
        self.packet_id.encode(dst)?;
        for topic in &self.topic_filters {
            topic.encode(dst)?;
        }
        Ok(())
    }

    /// Encodes the whole packet, fixed header included.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut dst = BytesMut::new();
        self.encode_to(&mut dst)?;
        Ok(dst.freeze())
    }

    /// Decodes packet id and topic filters, `src` is exactly the frame body.
    pub(crate) fn decode_body(mut src: Bytes) -> Result<Subscribe, DecodeError> {
        ensure!(src.remaining() >= 2, DecodeError::MissingPacketId);
        let packet_id = u16::decode(&mut src)?;
        let mut topic_filters = Vec::new();
        while src.has_remaining() {
            topic_filters.push(TopicFilter::decode(&mut src)?);
        }
        Ok(Subscribe { packet_id, topic_filters })
    }

    /// Decodes a SUBSCRIBE packet from `src`, fixed header included.
    ///
    /// Topic filters are read up to the end of the frame declared by the
    /// remaining length, bytes past it are ignored.
    pub fn decode(src: &[u8]) -> Result<Subscribe, DecodeError> {
        let (header, consumed) = FixedHeader::decode(src)?;
        ensure!(header.packet_type == PacketType::Subscribe, DecodeError::UnsupportedPacketType);
        ensure!(header.remaining_length >= 2, DecodeError::MissingPacketId);
        ensure!(src.len() >= header.frame_size(), DecodeError::InvalidLength);
        Subscribe::decode_body(Bytes::copy_from_slice(&src[consumed..header.frame_size()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let subscribe = Subscribe::new(0x1234)
            .topic("test", QoS::AtLeastOnce)
            .topic("filter", QoS::ExactlyOnce);
        assert_eq!(subscribe.packet_type(), PacketType::Subscribe);

        let header = subscribe.fixed_header().unwrap();
        assert_eq!(header.remaining_length, 2 + 7 + 9);
        assert_eq!(header.first_byte(), 0x82);

        let data = subscribe.encode().unwrap();
        assert_eq!(data.as_ref(), b"\x82\x12\x12\x34\x00\x04test\x01\x00\x06filter\x02");
        assert_eq!(header.remaining_length as usize, data.len() - header.encoded_size());
    }

    #[test]
    fn test_encode_empty() {
        let data = Subscribe::new(7).encode().unwrap();
        assert_eq!(data.as_ref(), b"\x82\x02\x00\x07");
    }

    #[test]
    fn test_decode() {
        assert_eq!(
            Subscribe::decode(b"\x82\x12\x12\x34\x00\x04test\x01\x00\x06filter\x02"),
            Ok(Subscribe::new(0x1234)
                .topic("test", QoS::AtLeastOnce)
                .topic("filter", QoS::ExactlyOnce))
        );
        assert_eq!(Subscribe::decode(b"\x82\x02\x00\x01"), Ok(Subscribe::new(1)));
    }

    #[test]
    fn test_decode_ignores_bytes_past_frame() {
        assert_eq!(
            Subscribe::decode(b"\x82\x09\x00\x05\x00\x04test\x00\x00\x04next\x01"),
            Ok(Subscribe::new(5).topic("test", QoS::AtMostOnce))
        );
    }

    #[test]
    fn test_decode_missing_packet_id() {
        assert_eq!(Subscribe::decode(b"\x82\x00"), Err(DecodeError::MissingPacketId));
        assert_eq!(Subscribe::decode(b"\x82\x01\x00"), Err(DecodeError::MissingPacketId));
        assert_eq!(
            Subscribe::decode_body(Bytes::from_static(b"\x01")),
            Err(DecodeError::MissingPacketId)
        );
    }

    #[test]
    fn test_decode_truncated() {
        // frame shorter than declared
        assert_eq!(
            Subscribe::decode(b"\x82\x09\x00\x05\x00\x04te"),
            Err(DecodeError::InvalidLength)
        );
        // filter runs past the declared frame
        assert_eq!(
            Subscribe::decode(b"\x82\x06\x00\x05\x00\x04test\x00"),
            Err(DecodeError::InvalidLength)
        );
        // qos byte missing
        assert_eq!(
            Subscribe::decode(b"\x82\x08\x00\x05\x00\x04test\x00"),
            Err(DecodeError::InvalidLength)
        );
    }

    #[test]
    fn test_decode_invalid_qos() {
        assert_eq!(
            Subscribe::decode(b"\x82\x09\x00\x05\x00\x04test\x03"),
            Err(DecodeError::MalformedPacket)
        );
        assert_eq!(
            Subscribe::decode(b"\x82\x09\x00\x05\x00\x04test\x41"),
            Err(DecodeError::MalformedPacket)
        );
    }

    #[test]
    fn test_decode_wrong_type() {
        assert_eq!(Subscribe::decode(b"\xa2\x02\x00\x01"), Err(DecodeError::UnsupportedPacketType));
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let mut subscribe = Subscribe::new(u16::MAX);
        for i in 0..40 {
            subscribe.add_topic(TopicFilter::new(format!("sensors/{i}/#"), QoS::AtLeastOnce));
        }
        subscribe.add_topic(TopicFilter::new("", QoS::AtMostOnce));

        let data = subscribe.encode().unwrap();
        let header = subscribe.fixed_header().unwrap();
        assert!(header.remaining_length > 127);
        assert_eq!(header.encoded_size(), 3);
        assert_eq!(data.len(), header.frame_size());

        let decoded = Subscribe::decode(&data).unwrap();
        assert_eq!(decoded.topic_filters[0].filter, "sensors/0/#");
        assert_eq!(decoded.topic_filters[39].filter, "sensors/39/#");
        assert_eq!(decoded, subscribe);
    }

    #[test]
    fn test_encode_too_long_filter() {
        let subscribe = Subscribe::new(1).topic("a".repeat(65_536), QoS::AtMostOnce);
        assert_eq!(subscribe.encode(), Err(EncodeError::InvalidLength));
    }
}
