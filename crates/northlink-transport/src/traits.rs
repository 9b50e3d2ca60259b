use std::fmt;

use bytes::Bytes;

use crate::error::Result;

/// Connection state reported by a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// The device is open and exchanging bytes.
    Ready,
    /// The device is gone. Worker loops stop when they observe this.
    NoConnection,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkMode::Ready => f.write_str("ready"),
            LinkMode::NoConnection => f.write_str("no-connection"),
        }
    }
}

/// Raw byte-level access to the radio dongle.
///
/// Methods take `&self` because one link is shared between the inbound and
/// outbound workers; implementations serialize access internally.
pub trait SerialLink: Send + Sync {
    /// Return every byte currently pending, or `None` if nothing is waiting.
    /// Never blocks.
    fn receive(&self) -> Result<Option<Bytes>>;

    /// Write all of `data` to the link.
    fn transmit(&self, data: &[u8]) -> Result<()>;

    /// Read exactly `n` bytes.
    ///
    /// Callers check [`SerialLink::bytes_waiting`] first; an implementation
    /// that cannot satisfy the read returns [`crate::TransportError::ShortRead`].
    fn read_exact(&self, n: usize) -> Result<Bytes>;

    /// Number of received bytes waiting to be read.
    fn bytes_waiting(&self) -> Result<usize>;

    /// Discard every pending received byte.
    fn drain(&self) -> Result<()>;

    /// Current link state.
    fn mode(&self) -> LinkMode;

    /// Close the link. Afterwards [`SerialLink::mode`] reports
    /// [`LinkMode::NoConnection`].
    fn close(&self);
}
