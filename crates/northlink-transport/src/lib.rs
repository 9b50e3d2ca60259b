//! Serial link abstraction for the northlink radio transport.
//!
//! Provides a unified interface over the byte stream to the radio dongle:
//! - A real serial device (behind the `serial` feature)
//! - An in-memory mock for tests and simulations
//!
//! This is the lowest layer of northlink. Everything else builds on top of
//! the [`SerialLink`] trait provided here.

pub mod error;
pub mod mock;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use traits::{LinkMode, SerialLink};

#[cfg(feature = "serial")]
pub use serial::SerialPortLink;
