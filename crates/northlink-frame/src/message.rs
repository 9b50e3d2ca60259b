use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;

use crate::error::FrameError;
use crate::ntrp::PACKET_HEADER_SIZE;

/// Message kinds carried in the packet header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HeaderKind {
    /// Positive acknowledgement.
    Ack = 0x01,
    /// Negative acknowledgement.
    Nak = 0x02,
    /// Parameter value assignment.
    Set = 0x03,
    /// Periodic parameter value report.
    Log = 0x04,
    /// Command request or response.
    Cmd = 0x05,
    /// Free-text message.
    Msg = 0x06,
    /// Router: open a radio pipe.
    OpenPipe = 0x10,
    /// Router: close a radio pipe.
    ClosePipe = 0x11,
    /// Router: leave routing mode.
    Exit = 0x12,
}

impl HeaderKind {
    /// Returns a short human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            HeaderKind::Ack => "ACK",
            HeaderKind::Nak => "NAK",
            HeaderKind::Set => "SET",
            HeaderKind::Log => "LOG",
            HeaderKind::Cmd => "CMD",
            HeaderKind::Msg => "MSG",
            HeaderKind::OpenPipe => "R_OPENPIPE",
            HeaderKind::ClosePipe => "R_CLOSEPIPE",
            HeaderKind::Exit => "R_EXIT",
        }
    }

    /// Returns true for messages whose payload is free text.
    pub fn is_text(self) -> bool {
        self == HeaderKind::Msg
    }

    /// Returns true for commands addressed to the dongle's router.
    pub fn is_router_command(self) -> bool {
        matches!(
            self,
            HeaderKind::OpenPipe | HeaderKind::ClosePipe | HeaderKind::Exit
        )
    }
}

impl TryFrom<u8> for HeaderKind {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(HeaderKind::Ack),
            0x02 => Ok(HeaderKind::Nak),
            0x03 => Ok(HeaderKind::Set),
            0x04 => Ok(HeaderKind::Log),
            0x05 => Ok(HeaderKind::Cmd),
            0x06 => Ok(HeaderKind::Msg),
            0x10 => Ok(HeaderKind::OpenPipe),
            0x11 => Ok(HeaderKind::ClosePipe),
            0x12 => Ok(HeaderKind::Exit),
            other => Err(FrameError::UnknownHeader(other)),
        }
    }
}

impl From<HeaderKind> for u8 {
    fn from(kind: HeaderKind) -> Self {
        kind as u8
    }
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded NTRP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// What kind of message this is.
    pub header: HeaderKind,
    /// Sender address.
    pub talker: u8,
    /// Destination address.
    pub receiver: u8,
    /// Sub-meaning within the header kind (e.g. a parameter index).
    pub data_id: u8,
    /// Message data.
    pub payload: Bytes,
}

impl Message {
    /// Create an unaddressed message. Talker and receiver are stamped on send.
    pub fn new(header: HeaderKind, data_id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            talker: 0,
            receiver: 0,
            data_id,
            payload: payload.into(),
        }
    }

    /// Create a command message.
    pub fn command(data_id: u8, payload: impl Into<Bytes>) -> Self {
        Self::new(HeaderKind::Cmd, data_id, payload)
    }

    /// Set talker and receiver.
    pub fn with_route(mut self, talker: u8, receiver: u8) -> Self {
        self.talker = talker;
        self.receiver = receiver;
        self
    }

    /// Declared packet size on the wire (header kind + data id + data).
    pub fn packet_size(&self) -> usize {
        PACKET_HEADER_SIZE + self.payload.len()
    }

    /// Payload as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_kind_byte_mapping() {
        for kind in [
            HeaderKind::Ack,
            HeaderKind::Nak,
            HeaderKind::Set,
            HeaderKind::Log,
            HeaderKind::Cmd,
            HeaderKind::Msg,
            HeaderKind::OpenPipe,
            HeaderKind::ClosePipe,
            HeaderKind::Exit,
        ] {
            assert_eq!(HeaderKind::try_from(u8::from(kind)).unwrap(), kind);
        }
        assert!(matches!(
            HeaderKind::try_from(0x7F),
            Err(FrameError::UnknownHeader(0x7F))
        ));
    }

    #[test]
    fn header_kind_classes() {
        assert!(HeaderKind::Msg.is_text());
        assert!(!HeaderKind::Log.is_text());
        assert!(HeaderKind::OpenPipe.is_router_command());
        assert!(!HeaderKind::Cmd.is_router_command());
    }

    #[test]
    fn packet_size_counts_header() {
        let msg = Message::command(1, vec![7u8]).with_route(b'0', b'2');
        assert_eq!(msg.packet_size(), 3);
        assert_eq!(msg.talker, b'0');
        assert_eq!(msg.receiver, b'2');
    }
}
