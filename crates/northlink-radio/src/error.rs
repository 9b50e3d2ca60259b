/// Errors that can occur in radio engine operations.
#[derive(Debug, thiserror::Error)]
pub enum RadioError {
    /// Link-level error.
    #[error("transport error: {0}")]
    Transport(#[from] northlink_transport::TransportError),

    /// Frame encoding or decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] northlink_frame::FrameError),

    /// Workers were started before a successful handshake.
    #[error("link is not synchronized")]
    NotSynchronized,

    /// The link is in the no-connection state.
    #[error("link has no connection")]
    NoConnection,

    /// The engine was already started.
    #[error("radio already started")]
    AlreadyStarted,

    /// The outbound worker is gone.
    #[error("radio stopped")]
    Stopped,

    /// Bandwidth outside the supported set.
    #[error("unsupported bandwidth {0} kbps (expected 250, 1000 or 2000)")]
    InvalidBandwidth(u32),

    /// A pipe with this address is already subscribed.
    #[error("pipe address {0:?} already subscribed")]
    DuplicateAddress(char),

    /// Every single-byte pipe address is in use.
    #[error("no pipe addresses left")]
    AddressesExhausted,

    /// Radio URI could not be parsed.
    #[error("invalid radio uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RadioError>;
