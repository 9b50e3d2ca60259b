use northlink_transport::TransportError;

/// Errors that can occur during frame reassembly and decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame does not begin with the start byte.
    #[error("invalid start byte 0x{found:02X}")]
    InvalidStartByte { found: u8 },

    /// The trailing byte is not the end byte.
    #[error("invalid end byte 0x{found:02X}")]
    InvalidEndByte { found: u8 },

    /// The header byte does not name a known message kind.
    #[error("unknown header kind 0x{0:02X}")]
    UnknownHeader(u8),

    /// The declared packet cannot hold a header kind and data id.
    #[error("packet too short ({size} bytes)")]
    PacketTooShort { size: usize },

    /// The packet exceeds the maximum size.
    #[error("packet too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The buffer length disagrees with the declared packet size.
    #[error("frame length mismatch (declared {declared} bytes, got {actual})")]
    LengthMismatch { declared: usize, actual: usize },

    /// The underlying link failed.
    #[error("link error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
