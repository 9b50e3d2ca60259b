use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use northlink_frame::Message;
use tracing::warn;

use crate::buffer::{MessageBuffer, DEFAULT_BUFFER_CAPACITY};
use crate::error::{RadioError, Result};

/// Air data rate of a radio pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bandwidth {
    Kbps250,
    #[default]
    Kbps1000,
    Kbps2000,
}

impl Bandwidth {
    /// Rate in kbps.
    pub fn kbps(self) -> u32 {
        match self {
            Bandwidth::Kbps250 => 250,
            Bandwidth::Kbps1000 => 1000,
            Bandwidth::Kbps2000 => 2000,
        }
    }

    /// Speed code the dongle firmware uses.
    pub fn speed_code(self) -> u8 {
        match self {
            Bandwidth::Kbps250 => 0,
            Bandwidth::Kbps1000 => 1,
            Bandwidth::Kbps2000 => 2,
        }
    }

    /// Parse a dongle speed code.
    pub fn from_speed_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Bandwidth::Kbps250),
            1 => Some(Bandwidth::Kbps1000),
            2 => Some(Bandwidth::Kbps2000),
            _ => None,
        }
    }
}

impl TryFrom<u32> for Bandwidth {
    type Error = RadioError;

    fn try_from(kbps: u32) -> Result<Self> {
        match kbps {
            250 => Ok(Bandwidth::Kbps250),
            1000 => Ok(Bandwidth::Kbps1000),
            2000 => Ok(Bandwidth::Kbps2000),
            other => Err(RadioError::InvalidBandwidth(other)),
        }
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}kbps", self.kbps())
    }
}

/// How a pipe handles messages the inbound worker routes to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RxMode {
    /// Messages accumulate in the inbox for polling.
    #[default]
    Buffered,
    /// Messages go straight to the registered handler.
    Callback,
}

/// Receives messages for a pipe in [`RxMode::Callback`].
///
/// Called on the inbound worker thread; keep it short.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, msg: Message);
}

impl<F> MessageHandler for F
where
    F: Fn(Message) + Send + Sync,
{
    fn handle(&self, msg: Message) {
        self(msg)
    }
}

struct Delivery {
    mode: RxMode,
    handler: Option<Arc<dyn MessageHandler>>,
}

/// A logical, addressed channel multiplexed over the radio link.
///
/// The `id` is the single-byte address messages are routed by; `address` is
/// the radio address the dongle listens on.
pub struct Pipe {
    id: u8,
    channel: u8,
    bandwidth: Bandwidth,
    address: String,
    inbox: MessageBuffer,
    delivery: RwLock<Delivery>,
    active: AtomicBool,
}

impl Pipe {
    /// Default radio address used by the vehicle firmware.
    pub const DEFAULT_ADDRESS: &'static str = "E7E7E7E301";

    /// Create a pipe with an unassigned id.
    pub fn new(channel: u8, bandwidth: Bandwidth, address: impl Into<String>) -> Self {
        Self {
            id: 0,
            channel,
            bandwidth,
            address: address.into(),
            inbox: MessageBuffer::new(DEFAULT_BUFFER_CAPACITY),
            delivery: RwLock::new(Delivery {
                mode: RxMode::Buffered,
                handler: None,
            }),
            active: AtomicBool::new(true),
        }
    }

    /// Set the routing id.
    pub fn with_id(mut self, id: u8) -> Self {
        self.id = id;
        self
    }

    /// Routing id (single-character address).
    pub fn id(&self) -> u8 {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u8) {
        self.id = id;
    }

    /// Logical radio channel.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Change the radio channel.
    pub fn set_channel(&mut self, channel: u8) {
        self.channel = channel;
    }

    /// Air data rate.
    pub fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }

    /// Change the air data rate.
    ///
    /// Unsupported rates are rejected and the current rate is kept.
    pub fn set_bandwidth(&mut self, kbps: u32) -> Result<()> {
        match Bandwidth::try_from(kbps) {
            Ok(bandwidth) => {
                self.bandwidth = bandwidth;
                Ok(())
            }
            Err(err) => {
                warn!(pipe = %char::from(self.id), kbps, "rejected bandwidth");
                Err(err)
            }
        }
    }

    /// Radio address string.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Change the radio address.
    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    /// Radio address as the six bytes the dongle expects.
    ///
    /// Hex pairs are decoded; anything else is taken byte for byte. Short
    /// addresses are zero padded.
    pub fn address_bytes(&self) -> [u8; 6] {
        let mut out = [0u8; 6];
        let text = self.address.as_bytes();
        let is_hex = text.len() % 2 == 0 && text.iter().all(u8::is_ascii_hexdigit);
        if is_hex {
            for (slot, pair) in out.iter_mut().zip(text.chunks(2)) {
                let pair = std::str::from_utf8(pair).unwrap_or("00");
                *slot = u8::from_str_radix(pair, 16).unwrap_or(0);
            }
        } else {
            for (slot, byte) in out.iter_mut().zip(text) {
                *slot = *byte;
            }
        }
        out
    }

    /// The pipe's inbox.
    pub fn inbox(&self) -> &MessageBuffer {
        &self.inbox
    }

    /// Current receive-handling mode.
    pub fn rx_mode(&self) -> RxMode {
        self.delivery
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .mode
    }

    /// Switch receive-handling mode.
    ///
    /// Waits for any delivery in progress, so no message is handled under
    /// the old mode after this returns.
    pub fn set_rx_mode(&self, mode: RxMode) {
        self.delivery
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .mode = mode;
    }

    /// Register the handler used in [`RxMode::Callback`].
    pub fn set_handler(&self, handler: Arc<dyn MessageHandler>) {
        self.delivery
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .handler = Some(handler);
    }

    /// Hand a routed message to the inbox or the handler.
    ///
    /// Callback mode without a handler falls back to the inbox.
    pub fn deliver(&self, msg: Message) {
        let delivery = self.delivery.read().unwrap_or_else(PoisonError::into_inner);
        match (delivery.mode, delivery.handler.as_ref()) {
            (RxMode::Callback, Some(handler)) => handler.handle(msg),
            _ => self.inbox.append(msg),
        }
    }

    /// Whether the pipe is still in use.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark the pipe as no longer in use.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl fmt::Debug for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("id", &char::from(self.id))
            .field("channel", &self.channel)
            .field("bandwidth", &self.bandwidth)
            .field("address", &self.address)
            .field("rx_mode", &self.rx_mode())
            .field("active", &self.is_active())
            .finish()
    }
}
