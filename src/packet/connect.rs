use ntex_bytes::{Buf, BufMut, ByteString, Bytes, BytesMut};

use crate::error::{DecodeError, EncodeError, ProtocolName};
use crate::header::FixedHeader;
use crate::types::{ConnectFlags, PacketType, QoS, MQTT, MQTT_LEVEL_3, WILL_QOS_SHIFT};
use crate::utils::{Decode, Encode, MAX_VARIABLE_LENGTH};

/// Protocol Name + Protocol Level + Connect Flags + Keep Alive
pub const VARIABLE_HEADER_SIZE: usize = 2 + 4 + 1 + 1 + 2;

#[derive(Debug, PartialEq, Eq, Clone)]
/// Connection Will
pub struct LastWill {
    /// the Will Topic
    pub topic: ByteString,
    /// defines the Application Message that is to be published to the Will Topic
    pub message: Bytes,
}

#[derive(Debug, PartialEq, Eq, Clone)]
/// Connect packet content
///
/// Connect flags are kept as separate fields. `will_qos` holds the raw two-bit
/// value, so the reserved value `3` survives a decode/encode cycle unchanged.
pub struct Connect {
    /// protocol revision, `4` for MQTT v3.1.1
    pub protocol_level: u8,
    pub username_flag: bool,
    pub password_flag: bool,
    /// the Will Message is to be Retained when it is published.
    pub will_retain: bool,
    pub will_flag: bool,
    /// the handling of the Session state.
    pub clean_session: bool,
    /// the QoS level to be used when publishing the Will Message, `0..=3`.
    pub will_qos: u8,
    /// a time interval measured in seconds.
    pub keep_alive: u16,
    /// identifies the Client to the Server.
    pub client_id: ByteString,
    /// present when `will_flag` is set
    pub last_will: Option<LastWill>,
    /// present when `username_flag` is set
    pub username: Option<ByteString>,
    /// present when `password_flag` is set
    pub password: Option<Bytes>,
}

impl Default for Connect {
    fn default() -> Self {
        Connect {
            protocol_level: MQTT_LEVEL_3,
            username_flag: false,
            password_flag: false,
            will_retain: false,
            will_flag: false,
            clean_session: false,
            will_qos: 0,
            keep_alive: 0,
            client_id: ByteString::new(),
            last_will: None,
            username: None,
            password: None,
        }
    }
}

impl Connect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packet_type(&self) -> PacketType {
        PacketType::Connect
    }

    /// Set client_id value
    pub fn client_id<T>(mut self, client_id: T) -> Self
    where
        ByteString: From<T>,
    {
        self.client_id = client_id.into();
        self
    }

    /// Set keep alive interval, in seconds
    pub fn keep_alive(mut self, keep_alive: u16) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set user name, the username flag follows
    pub fn username<T>(mut self, username: T) -> Self
    where
        ByteString: From<T>,
    {
        self.username_flag = true;
        self.username = Some(username.into());
        self
    }

    /// Set password, the password flag follows
    pub fn password(mut self, password: Bytes) -> Self {
        self.password_flag = true;
        self.password = Some(password);
        self
    }

    /// Set last will, will flag, qos and retain follow
    pub fn last_will<T>(mut self, topic: T, message: Bytes, qos: QoS, retain: bool) -> Self
    where
        ByteString: From<T>,
    {
        self.will_flag = true;
        self.will_qos = qos.into();
        self.will_retain = retain;
        self.last_will = Some(LastWill { topic: topic.into(), message });
        self
    }

    /// Will qos as a protocol level value
    ///
    /// Fails for the reserved value `3`.
    pub fn will_qos(&self) -> Result<QoS, DecodeError> {
        QoS::try_from(self.will_qos)
    }

    fn flags(&self) -> Result<ConnectFlags, EncodeError> {
        ensure!(self.will_qos <= 3, EncodeError::MalformedPacket);

        let mut flags = ConnectFlags::from_bits_truncate(self.will_qos << WILL_QOS_SHIFT);
        flags.set(ConnectFlags::USERNAME, self.username_flag);
        flags.set(ConnectFlags::PASSWORD, self.password_flag);
        flags.set(ConnectFlags::WILL_RETAIN, self.will_retain);
        flags.set(ConnectFlags::WILL, self.will_flag);
        flags.set(ConnectFlags::CLEAN_SESSION, self.clean_session);
        Ok(flags)
    }

    fn payload_size(&self) -> usize {
        let will = self
            .last_will
            .as_ref()
            .map_or(0, |will| will.topic.encoded_size() + will.message.encoded_size());
        self.client_id.encoded_size()
            + will
            + self.username.encoded_size()
            + self.password.encoded_size()
    }

    /// Fixed header of the encoded packet.
    pub fn fixed_header(&self) -> Result<FixedHeader, EncodeError> {
        let len = VARIABLE_HEADER_SIZE + self.payload_size();
        ensure!(len <= MAX_VARIABLE_LENGTH as usize, EncodeError::OverMaxPacketSize);
        Ok(FixedHeader::new(PacketType::Connect, len as u32))
    }

    /// Writes protocol name, level, connect flags and keep alive, 10 bytes.
    pub fn encode_variable_header(&self, dst: &mut BytesMut) -> Result<(), EncodeError> {
        ensure!(self.protocol_level == MQTT_LEVEL_3, EncodeError::UnsupportedVersion);
        let flags = self.flags()?;

        dst.reserve(VARIABLE_HEADER_SIZE);
        dst.put_u16(MQTT.len() as u16);
        dst.put_slice(MQTT);
        dst.put_u8(self.protocol_level);
        dst.put_u8(flags.bits());
        dst.put_u16(self.keep_alive);
        Ok(())
    }

    /// Reads the 10 byte variable header.
    ///
    /// Payload fields of the returned packet are empty.
    pub fn decode_variable_header(src: &mut Bytes) -> Result<Connect, DecodeError> {
        ensure!(src.remaining() >= VARIABLE_HEADER_SIZE, DecodeError::InvalidLength);
        let len = src.get_u16();
        let name = src.split_to(4);
        let name = [name[0], name[1], name[2], name[3]];
        ensure!(
            len == 4 && name == MQTT,
            DecodeError::InvalidProtocol(ProtocolName { len, name })
        );

        let level = src.get_u8();
        ensure!(level == MQTT_LEVEL_3, DecodeError::UnsupportedProtocolLevel(level));

        let flags =
            ConnectFlags::from_bits(src.get_u8()).ok_or(DecodeError::ConnectReservedFlagSet)?;
        let keep_alive = src.get_u16();

        Ok(Connect {
            protocol_level: level,
            username_flag: flags.contains(ConnectFlags::USERNAME),
            password_flag: flags.contains(ConnectFlags::PASSWORD),
            will_retain: flags.contains(ConnectFlags::WILL_RETAIN),
            will_flag: flags.contains(ConnectFlags::WILL),
            clean_session: flags.contains(ConnectFlags::CLEAN_SESSION),
            will_qos: (flags & ConnectFlags::WILL_QOS).bits() >> WILL_QOS_SHIFT,
            keep_alive,
            ..Connect::default()
        })
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
        ensure!(
            self.will_flag == self.last_will.is_some()
                && self.username_flag == self.username.is_some()
                && self.password_flag == self.password.is_some(),
            EncodeError::MalformedPacket
        );
        let header = self.fixed_header()?;
        dst.reserve(header.frame_size());
        header.encode(dst)?;
        self.encode_variable_header(dst)?;
        self.client_id.encode(dst)?;
        if let Some(LastWill { ref topic, ref message }) = self.last_will {
            topic.encode(dst)?;
            message.encode(dst)?;
        }
        self.username.encode(dst)?;
        self.password.encode(dst)
    }

    /// Encodes the whole packet, fixed header included.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut dst = BytesMut::new();
        self.encode_to(&mut dst)?;
        Ok(dst.freeze())
    }

    /// Decodes variable header and payload.
    ///
    /// An empty client id is assumed if nothing follows the variable header.
    pub(crate) fn decode_body(src: &mut Bytes) -> Result<Connect, DecodeError> {
        let mut connect = Connect::decode_variable_header(src)?;
        if src.has_remaining() {
            connect.client_id = ByteString::decode(src)?;
        }
        if connect.will_flag {
            let topic = ByteString::decode(src)?;
            let message = Bytes::decode(src)?;
            connect.last_will = Some(LastWill { topic, message });
        }
        if connect.username_flag {
            connect.username = Some(ByteString::decode(src)?);
        }
        if connect.password_flag {
            connect.password = Some(Bytes::decode(src)?);
        }
        Ok(connect)
    }

    /// Decodes a CONNECT packet from `src`, fixed header included.
    ///
    /// `src` must hold at least the frame declared by the remaining length.
    /// The payload is read from everything following the fixed header.
    pub fn decode(src: &[u8]) -> Result<Connect, DecodeError> {
        let (header, consumed) = FixedHeader::decode(src)?;
        ensure!(header.packet_type == PacketType::Connect, DecodeError::UnsupportedPacketType);
        ensure!(src.len() >= header.frame_size(), DecodeError::InvalidLength);
        Connect::decode_body(&mut Bytes::copy_from_slice(&src[consumed..]))
    }
}
