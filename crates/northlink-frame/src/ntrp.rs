//! NTRP protocol constants shared with the dongle firmware.

/// First byte of every frame.
pub const START_BYTE: u8 = b'>';

/// Last byte of every frame.
pub const END_BYTE: u8 = b'\n';

/// Largest packet (header kind + data id + data) a frame may carry.
pub const MAX_PACKET_SIZE: usize = 32;

/// Bytes around the packet: start, talker, receiver, size, end.
pub const FRAME_OVERHEAD: usize = 5;

/// Header kind and data id at the front of every packet.
pub const PACKET_HEADER_SIZE: usize = 2;

/// Largest data section a single message can carry.
pub const MAX_DATA_SIZE: usize = MAX_PACKET_SIZE - PACKET_HEADER_SIZE;

/// Text the dongle repeats until the host pairs with it.
pub const SYNC_MARKER: &str = "-S-";

/// Reply that completes the handshake.
pub const PAIR_MARKER: &str = "-P-";

/// Address of the ground station.
pub const MASTER_ID: u8 = b'0';

/// Address of the dongle's router.
pub const ROUTER_ID: u8 = b'1';
