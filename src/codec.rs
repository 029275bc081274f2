use std::cell::Cell;

use ntex_bytes::{Buf, BytesMut};
use ntex_codec::{Decoder, Encoder};

use crate::config::CodecConfig;
use crate::error::{DecodeError, EncodeError};
use crate::header::FixedHeader;
use crate::packet::Packet;

#[derive(Debug, Clone)]
/// Mqtt v3.1.1 frame codec
pub struct Codec {
    state: Cell<DecodeState>,
    max_size: Cell<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DecodeState {
    FrameHeader,
    Frame(FixedHeader),
}

impl Codec {
    /// Create `Codec` instance
    pub fn new() -> Self {
        Codec { state: Cell::new(DecodeState::FrameHeader), max_size: Cell::new(0) }
    }

    /// Create `Codec` instance from configuration
    pub fn with_config(config: &CodecConfig) -> Self {
        let codec = Codec::new();
        codec.set_max_size(config.max_size);
        codec
    }

    /// Set max frame size.
    ///
    /// Applies to the remaining length of both inbound and outbound frames.
    /// If max size is set to `0`, size is unlimited.
    /// By default max size is set to `0`
    pub fn set_max_size(&self, size: u32) {
        self.max_size.set(size);
    }

    fn check_size(&self, remaining_length: u32) -> bool {
        let max_size = self.max_size.get();
        max_size == 0 || remaining_length <= max_size
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for Codec {
    type Item = (Packet, u32);
    type Error = DecodeError;

    fn decode(&self, src: &mut BytesMut) -> Result<Option<Self::Item>, DecodeError> {
        loop {
            match self.state.get() {
                DecodeState::FrameHeader => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    match FixedHeader::parse(src.as_ref())? {
                        Some((header, consumed)) => {
                            // check max message size
                            if !self.check_size(header.remaining_length) {
                                log::debug!(
                                    "Frame of {} bytes exceeds max size {}",
                                    header.remaining_length,
                                    self.max_size.get()
                                );
                                return Err(DecodeError::MaxSizeExceeded);
                            }
                            log::trace!("Decoded frame header: {:?}", header);
                            src.advance(consumed);
                            self.state.set(DecodeState::Frame(header));

                            let remaining_length = header.remaining_length as usize;
                            if src.len() < remaining_length {
                                // extend receiving buffer to fit the whole frame
                                src.reserve(remaining_length - src.len());
                                return Ok(None);
                            }
                        }
                        None => return Ok(None),
                    }
                }
                DecodeState::Frame(header) => {
                    if src.len() < header.remaining_length as usize {
                        return Ok(None);
                    }
                    let frame = src.split_to(header.remaining_length as usize).freeze();
                    self.state.set(DecodeState::FrameHeader);
                    let packet = Packet::decode_frame(header, frame).map_err(|err| {
                        log::debug!("Failed to decode {:?} frame: {}", header.packet_type, err);
                        err
                    })?;
                    // one byte for the packet type, up to four for the remaining length
                    src.reserve(5);
                    return Ok(Some((packet, header.remaining_length)));
                }
            }
        }
    }
}

impl Encoder for Codec {
    type Item = Packet;
    type Error = EncodeError;

    fn encode(&self, item: Self::Item, dst: &mut BytesMut) -> Result<(), EncodeError> {
        let header = item.fixed_header()?;
        if !self.check_size(header.remaining_length) {
            return Err(EncodeError::OverMaxPacketSize);
        }
        dst.reserve(header.remaining_length as usize + 5);
        item.encode_to(dst)
    }
}
