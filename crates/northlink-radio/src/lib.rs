//! Duplex radio engine with pipe multiplexing.
//!
//! This is the "just works" layer. Synchronize with the dongle, open pipes,
//! send messages, and let the inbound worker fan replies out to each pipe's
//! inbox or handler.

pub mod buffer;
pub mod error;
pub mod pipe;
pub mod radio;
pub mod stats;
pub mod sync;
pub mod uri;

pub use buffer::{MessageBuffer, DEFAULT_BUFFER_CAPACITY};
pub use error::{RadioError, Result};
pub use pipe::{Bandwidth, MessageHandler, Pipe, RxMode};
pub use radio::{Radio, RadioConfig, TextLogHook, PIPE_ADDRESS_BASELINE};
pub use stats::{RadioStats, StatsSnapshot};
pub use sync::{synchronize, SyncConfig, SyncOutcome};
pub use uri::RadioUri;
