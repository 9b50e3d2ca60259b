use std::fmt;
use std::io;

use northlink_cmd::CommandError;
use northlink_frame::FrameError;
use northlink_radio::RadioError;
use northlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::NoConnection => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn radio_error(context: &str, err: RadioError) -> CliError {
    match err {
        RadioError::Transport(err) => transport_error(context, err),
        RadioError::Frame(err) => frame_error(context, err),
        RadioError::NotSynchronized => CliError::new(TIMEOUT, format!("{context}: {err}")),
        RadioError::NoConnection | RadioError::Stopped => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
        RadioError::InvalidBandwidth(_) | RadioError::InvalidUri { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn command_error(context: &str, err: CommandError) -> CliError {
    match err {
        CommandError::Radio(err) => radio_error(context, err),
        CommandError::NotConnected | CommandError::SyncAborted { .. } => {
            CliError::new(TIMEOUT, format!("{context}: {err}"))
        }
        CommandError::UnknownParameter(_) => CliError::new(USAGE, format!("{context}: {err}")),
        CommandError::TableOverflow => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_keep_their_code() {
        let err = CommandError::Radio(RadioError::Transport(TransportError::NoConnection));
        assert_eq!(command_error("sync", err).code, FAILURE);

        let err = RadioError::Frame(FrameError::Transport(TransportError::Io(
            io::Error::from(io::ErrorKind::PermissionDenied),
        )));
        assert_eq!(radio_error("start", err).code, PERMISSION_DENIED);
    }

    #[test]
    fn usage_errors_map_to_usage() {
        assert_eq!(radio_error("uri", RadioError::InvalidBandwidth(300)).code, USAGE);
        assert_eq!(
            command_error("push", CommandError::UnknownParameter(4)).code,
            USAGE
        );
    }

    #[test]
    fn message_carries_context() {
        let err = command_error("synchronize failed", CommandError::NotConnected);
        assert_eq!(err.code, TIMEOUT);
        assert_eq!(err.to_string(), "synchronize failed: not connected");
    }
}
