use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::message::{HeaderKind, Message};
use crate::ntrp::{END_BYTE, FRAME_OVERHEAD, MAX_PACKET_SIZE, PACKET_HEADER_SIZE, START_BYTE};

/// Converts between raw frames and messages.
///
/// The frame reader only knows where a frame starts and how long it is;
/// everything inside the frame, the trailing byte included, belongs to the
/// codec.
pub trait Codec: Send + Sync {
    /// Decode one complete frame.
    fn decode(&self, raw: &[u8]) -> Result<Message>;

    /// Encode a message into a complete frame.
    fn encode(&self, msg: &Message) -> Result<Bytes>;
}

/// The NTRP wire codec.
///
/// Wire format:
/// ```text
/// ┌───────┬────────┬──────────┬──────┬────────┬─────────┬──────────┬─────┐
/// │ START │ Talker │ Receiver │ Size │ Header │ Data ID │ Data     │ END │
/// │ (1B)  │ (1B)   │ (1B)     │ (1B) │ (1B)   │ (1B)    │ Size - 2 │ (1B)│
/// └───────┴────────┴──────────┴──────┴────────┴─────────┴──────────┴─────┘
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NtrpCodec;

impl Codec for NtrpCodec {
    fn decode(&self, raw: &[u8]) -> Result<Message> {
        if raw.len() < FRAME_OVERHEAD + PACKET_HEADER_SIZE {
            return Err(FrameError::LengthMismatch {
                declared: raw.get(3).copied().unwrap_or(0) as usize + FRAME_OVERHEAD,
                actual: raw.len(),
            });
        }
        if raw[0] != START_BYTE {
            return Err(FrameError::InvalidStartByte { found: raw[0] });
        }

        let size = raw[3] as usize;
        if size < PACKET_HEADER_SIZE {
            return Err(FrameError::PacketTooShort { size });
        }
        if size > MAX_PACKET_SIZE {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: MAX_PACKET_SIZE,
            });
        }
        if raw.len() != size + FRAME_OVERHEAD {
            return Err(FrameError::LengthMismatch {
                declared: size + FRAME_OVERHEAD,
                actual: raw.len(),
            });
        }

        let end = raw[raw.len() - 1];
        if end != END_BYTE {
            return Err(FrameError::InvalidEndByte { found: end });
        }

        let header = HeaderKind::try_from(raw[4])?;
        let data = &raw[6..6 + size - PACKET_HEADER_SIZE];

        Ok(Message {
            header,
            talker: raw[1],
            receiver: raw[2],
            data_id: raw[5],
            payload: Bytes::copy_from_slice(data),
        })
    }

    fn encode(&self, msg: &Message) -> Result<Bytes> {
        let size = msg.packet_size();
        if size > MAX_PACKET_SIZE {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: MAX_PACKET_SIZE,
            });
        }

        let mut dst = BytesMut::with_capacity(size + FRAME_OVERHEAD);
        dst.put_u8(START_BYTE);
        dst.put_u8(msg.talker);
        dst.put_u8(msg.receiver);
        dst.put_u8(size as u8);
        dst.put_u8(msg.header.into());
        dst.put_u8(msg.data_id);
        dst.put_slice(&msg.payload);
        dst.put_u8(END_BYTE);
        Ok(dst.freeze())
    }
}

/// Configuration for frame reassembly.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Byte that opens every frame.
    pub start_byte: u8,
    /// Largest declared packet size accepted. Default: 32.
    pub max_packet_size: usize,
    /// How long to wait for the rest of a frame once it has started.
    pub byte_timeout: Duration,
    /// Sleep between polls while waiting for bytes.
    pub idle_tick: Duration,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            start_byte: START_BYTE,
            max_packet_size: MAX_PACKET_SIZE,
            byte_timeout: Duration::from_millis(100),
            idle_tick: Duration::from_millis(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ntrp::MAX_DATA_SIZE;

    fn frame(talker: u8, receiver: u8, header: u8, data_id: u8, data: &[u8]) -> Vec<u8> {
        let mut raw = vec![START_BYTE, talker, receiver, (data.len() + 2) as u8, header, data_id];
        raw.extend_from_slice(data);
        raw.push(END_BYTE);
        raw
    }

    #[test]
    fn decode_command_frame() {
        let raw = frame(b'2', b'0', 0x05, 1, b"ALT_HOLD");
        let msg = NtrpCodec.decode(&raw).unwrap();

        assert_eq!(msg.header, HeaderKind::Cmd);
        assert_eq!(msg.talker, b'2');
        assert_eq!(msg.receiver, b'0');
        assert_eq!(msg.data_id, 1);
        assert_eq!(msg.payload.as_ref(), b"ALT_HOLD");
    }

    #[test]
    fn encode_matches_wire_layout() {
        let msg = Message::new(HeaderKind::Set, 4, vec![0x10, 0x20]).with_route(b'0', b'3');
        let raw = NtrpCodec.encode(&msg).unwrap();
        assert_eq!(raw.as_ref(), frame(b'0', b'3', 0x03, 4, &[0x10, 0x20]).as_slice());
        assert_eq!(NtrpCodec.decode(&raw).unwrap(), msg);
    }

    #[test]
    fn decode_empty_data() {
        let raw = frame(b'2', b'0', 0x01, 0, b"");
        let msg = NtrpCodec.decode(&raw).unwrap();
        assert_eq!(msg.header, HeaderKind::Ack);
        assert!(msg.payload.is_empty());
    }

    #[test]
    fn decode_rejects_bad_end_byte() {
        let mut raw = frame(b'2', b'0', 0x05, 1, b"x");
        let last = raw.len() - 1;
        raw[last] = 0x00;
        assert!(matches!(
            NtrpCodec.decode(&raw),
            Err(FrameError::InvalidEndByte { found: 0x00 })
        ));
    }

    #[test]
    fn decode_rejects_unknown_header() {
        let raw = frame(b'2', b'0', 0x7E, 1, b"x");
        assert!(matches!(
            NtrpCodec.decode(&raw),
            Err(FrameError::UnknownHeader(0x7E))
        ));
    }

    #[test]
    fn decode_rejects_length_mismatch() {
        let mut raw = frame(b'2', b'0', 0x05, 1, b"abc");
        raw.insert(6, b'z');
        assert!(matches!(
            NtrpCodec.decode(&raw),
            Err(FrameError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn decode_rejects_short_packet() {
        let raw = vec![START_BYTE, b'2', b'0', 1, 0x05, 0, END_BYTE];
        assert!(matches!(
            NtrpCodec.decode(&raw),
            Err(FrameError::PacketTooShort { size: 1 })
        ));
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let msg = Message::command(1, vec![0u8; MAX_DATA_SIZE + 1]);
        assert!(matches!(
            NtrpCodec.encode(&msg),
            Err(FrameError::PayloadTooLarge { .. })
        ));

        let msg = Message::command(1, vec![0u8; MAX_DATA_SIZE]);
        assert!(NtrpCodec.encode(&msg).is_ok());
    }
}
