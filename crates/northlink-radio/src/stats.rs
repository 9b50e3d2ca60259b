use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by the radio workers.
#[derive(Debug, Default)]
pub struct RadioStats {
    frames_received: AtomicU64,
    frames_abandoned: AtomicU64,
    bytes_discarded: AtomicU64,
    decode_failures: AtomicU64,
    messages_routed: AtomicU64,
    messages_dropped: AtomicU64,
    frames_sent: AtomicU64,
    send_failures: AtomicU64,
}

/// Point-in-time copy of [`RadioStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames that decoded into a message.
    pub frames_received: u64,
    /// Frames given up on during reassembly.
    pub frames_abandoned: u64,
    /// Bytes skipped while seeking a start byte.
    pub bytes_discarded: u64,
    /// Assembled frames the codec refused.
    pub decode_failures: u64,
    /// Messages handed to a subscribed pipe.
    pub messages_routed: u64,
    /// Messages with no matching pipe.
    pub messages_dropped: u64,
    /// Frames written to the link.
    pub frames_sent: u64,
    /// Frames the link refused to transmit.
    pub send_failures: u64,
}

impl RadioStats {
    pub(crate) fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_abandoned(&self) {
        self.frames_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bytes_discarded(&self, count: usize) {
        self.bytes_discarded
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn decode_failed(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn message_routed(&self) {
        self.messages_routed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn message_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn send_failed(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_abandoned: self.frames_abandoned.load(Ordering::Relaxed),
            bytes_discarded: self.bytes_discarded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            messages_routed: self.messages_routed.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}
