//! NTRP frame reassembly and message codec.
//!
//! Every message on the serial link is framed as:
//! - A start byte for stream synchronization
//! - Talker and receiver ids (one byte each)
//! - A one-byte packet size
//! - The packet (header kind, data id, data) and a trailing end byte
//!
//! [`FrameReader`] pulls frames out of a noisy byte stream with bounded
//! waits; a [`Codec`] turns them into [`Message`] values.

pub mod codec;
pub mod error;
pub mod message;
pub mod ntrp;
pub mod reader;

pub use codec::{Codec, FrameConfig, NtrpCodec};
pub use error::{FrameError, Result};
pub use message::{HeaderKind, Message};
pub use reader::{Abandon, FrameReader, ReadOutcome};
