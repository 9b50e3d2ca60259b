//! Ground-to-vehicle radio link for the North flight-control network.
//!
//! northlink turns the serial byte stream to and from a radio dongle into
//! addressed, typed message pipes, and pulls the vehicle's parameter table
//! across one of them.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial link abstraction (real port, in-memory mock)
//! - [`frame`]: NTRP frame reassembly and message codec
//! - [`radio`]: duplex engine, pipes and the link handshake
//! - [`cmd`]: parameter table synchronization (behind `cmd` feature)

/// Re-export transport types.
pub mod transport {
    pub use northlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use northlink_frame::*;
}

/// Re-export radio engine types.
pub mod radio {
    pub use northlink_radio::*;
}

/// Re-export commander types (requires `cmd` feature).
#[cfg(feature = "cmd")]
pub mod cmd {
    pub use northlink_cmd::*;
}
