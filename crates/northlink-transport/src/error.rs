/// Errors that can occur on the serial link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[cfg(feature = "serial")]
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// The serial driver rejected a control request.
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),

    /// An I/O error occurred on the byte stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes than requested were available.
    #[error("short read ({actual} of {expected} bytes)")]
    ShortRead { expected: usize, actual: usize },

    /// The link is in the no-connection state.
    #[error("link has no connection")]
    NoConnection,
}

pub type Result<T> = std::result::Result<T, TransportError>;
