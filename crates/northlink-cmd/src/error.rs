use northlink_radio::RadioError;

/// Errors that can occur in commander operations.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Radio engine error.
    #[error("radio error: {0}")]
    Radio(#[from] RadioError),

    /// The commander has not completed [`crate::Commander::connect`].
    #[error("not connected")]
    NotConnected,

    /// No table entry at this index.
    #[error("parameter {0} not found in table")]
    UnknownParameter(u8),

    /// The remote table has more entries than a one-byte index can request.
    #[error("parameter table exceeds 256 entries")]
    TableOverflow,

    /// Synchronization hit the configured request limit.
    #[error("synchronization aborted after {requests} requests ({entries} entries received)")]
    SyncAborted { requests: u64, entries: usize },
}

pub type Result<T> = std::result::Result<T, CommandError>;
