use std::sync::Arc;
use std::time::Instant;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use northlink_transport::SerialLink;
use tracing::trace;

use crate::codec::FrameConfig;
use crate::error::Result;

/// Header bytes between the start byte and the size byte.
const ROUTE_BYTES: usize = 2;

/// Why a frame in progress was given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abandon {
    /// Bytes before any start byte were thrown away.
    Noise { discarded: usize },
    /// The talker/receiver bytes did not arrive in time.
    HeaderTimeout,
    /// The declared packet size is above the maximum.
    Oversized { size: usize, max: usize },
    /// The packet and trailing byte did not arrive in time.
    PayloadTimeout { expected: usize, available: usize },
}

/// Result of one pass of the reassembly state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Nothing was pending on the link.
    Idle,
    /// The frame in progress was dropped.
    Abandoned(Abandon),
    /// A complete raw frame, ready for the codec.
    Frame(Bytes),
}

/// Reassembles frames from the raw link byte stream.
///
/// Every wait is bounded by [`FrameConfig::byte_timeout`], so a truncated or
/// malformed frame never stalls the caller. Bytes that were consumed as part
/// of an abandoned or rejected frame are re-scanned, so a real frame hiding
/// behind a spurious start byte is still found.
pub struct FrameReader<L: ?Sized> {
    link: Arc<L>,
    pending: BytesMut,
    config: FrameConfig,
}

impl<L: SerialLink + ?Sized> FrameReader<L> {
    /// Create a frame reader with default configuration.
    pub fn new(link: Arc<L>) -> Self {
        Self::with_config(link, FrameConfig::default())
    }

    /// Create a frame reader with explicit configuration.
    pub fn with_config(link: Arc<L>, config: FrameConfig) -> Self {
        Self {
            link,
            pending: BytesMut::new(),
            config,
        }
    }

    /// Run the state machine once.
    ///
    /// Returns [`ReadOutcome::Idle`] after a short sleep when nothing is
    /// pending. Only link failures are returned as errors.
    pub fn read_frame(&mut self) -> Result<ReadOutcome> {
        let start = self.config.start_byte;

        let mut discarded = 0usize;
        loop {
            if self.available()? == 0 {
                if discarded > 0 {
                    trace!(discarded, "discarded bytes while seeking start byte");
                    return Ok(ReadOutcome::Abandoned(Abandon::Noise { discarded }));
                }
                std::thread::sleep(self.config.idle_tick);
                return Ok(ReadOutcome::Idle);
            }
            if self.take(1)?[0] == start {
                break;
            }
            discarded += 1;
        }
        if discarded > 0 {
            trace!(discarded, "discarded bytes before start byte");
        }

        if self.wait_for(ROUTE_BYTES)? < ROUTE_BYTES {
            return Ok(ReadOutcome::Abandoned(Abandon::HeaderTimeout));
        }
        let route = self.take(ROUTE_BYTES)?;

        // The size byte is normally already here; give it the same budget.
        if self.wait_for(1)? < 1 {
            self.unread(&route);
            return Ok(ReadOutcome::Abandoned(Abandon::HeaderTimeout));
        }
        let size_byte = self.take(1)?[0];
        let size = size_byte as usize;

        let mut consumed = BytesMut::with_capacity(ROUTE_BYTES + 1);
        consumed.put_slice(&route);
        consumed.put_u8(size_byte);

        if size > self.config.max_packet_size {
            self.unread(&consumed);
            return Ok(ReadOutcome::Abandoned(Abandon::Oversized {
                size,
                max: self.config.max_packet_size,
            }));
        }

        let expected = size + 1;
        let available = self.wait_for(expected)?;
        if available < expected {
            self.unread(&consumed);
            return Ok(ReadOutcome::Abandoned(Abandon::PayloadTimeout {
                expected,
                available,
            }));
        }
        let packet = self.take(expected)?;

        let mut frame = BytesMut::with_capacity(1 + consumed.len() + packet.len());
        frame.put_u8(start);
        frame.put_slice(&consumed);
        frame.put_slice(&packet);
        Ok(ReadOutcome::Frame(frame.freeze()))
    }

    /// Hand back a frame the codec refused.
    ///
    /// Everything after its start byte is scanned again before any new link
    /// bytes.
    pub fn reject(&mut self, raw: &[u8]) {
        if raw.len() > 1 {
            self.unread(&raw[1..]);
        }
    }

    /// Forget any bytes held back for re-scanning.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Borrow the underlying link.
    pub fn link(&self) -> &Arc<L> {
        &self.link
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn available(&self) -> Result<usize> {
        Ok(self.pending.len() + self.link.bytes_waiting()?)
    }

    /// Poll until `n` bytes are available or the byte timeout passes.
    /// Returns the number available when it stopped.
    fn wait_for(&self, n: usize) -> Result<usize> {
        let deadline = Instant::now() + self.config.byte_timeout;
        loop {
            let available = self.available()?;
            if available >= n || Instant::now() >= deadline {
                return Ok(available);
            }
            std::thread::sleep(self.config.idle_tick);
        }
    }

    fn take(&mut self, n: usize) -> Result<Bytes> {
        if self.pending.len() >= n {
            return Ok(self.pending.split_to(n).freeze());
        }
        let mut out = BytesMut::with_capacity(n);
        let from_pending = self.pending.len();
        out.put_slice(&self.pending);
        self.pending.advance(from_pending);
        out.put_slice(&self.link.read_exact(n - from_pending)?);
        Ok(out.freeze())
    }

    fn unread(&mut self, bytes: &[u8]) {
        let mut merged = BytesMut::with_capacity(bytes.len() + self.pending.len());
        merged.put_slice(bytes);
        merged.put_slice(&self.pending);
        self.pending = merged;
    }
}
