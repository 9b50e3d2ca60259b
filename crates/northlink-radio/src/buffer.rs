use std::sync::{Mutex, MutexGuard, PoisonError};

use northlink_frame::Message;

/// Inbox capacity of a pipe.
pub const DEFAULT_BUFFER_CAPACITY: usize = 20;

/// Fixed-capacity message store that keeps the most recent entries.
///
/// Appending to a full buffer silently evicts the oldest unread entry.
/// Reads return the most recent entry first: a run of appends `a, b, c` is
/// read back as `c, b, a`.
///
/// The buffer holds `capacity + 1` slots with two wrapping cursors: `write`
/// points at the newest entry and `limit` marks the slot just before the
/// oldest one. The cursors and slots share one mutex, so the inbound worker
/// and a polling reader never interleave.
pub struct MessageBuffer {
    inner: Mutex<Ring>,
    capacity: usize,
}

struct Ring {
    slots: Vec<Option<Message>>,
    write: usize,
    limit: usize,
}

impl Ring {
    fn len(&self) -> usize {
        let slots = self.slots.len();
        (self.write + slots - self.limit) % slots
    }
}

impl MessageBuffer {
    /// Create a buffer holding at most `capacity` messages.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Ring {
                slots: vec![None; capacity + 1],
                write: 0,
                limit: 0,
            }),
            capacity,
        }
    }

    /// Store a message, evicting the oldest unread one when full.
    pub fn append(&self, msg: Message) {
        let mut ring = self.lock();
        let slots = ring.slots.len();
        ring.write = (ring.write + 1) % slots;
        if ring.write == ring.limit {
            ring.limit = (ring.limit + 1) % slots;
        }
        let write = ring.write;
        ring.slots[write] = Some(msg);
    }

    /// Take the most recent unread message.
    pub fn read(&self) -> Option<Message> {
        let mut ring = self.lock();
        if ring.len() == 0 {
            return None;
        }
        let slots = ring.slots.len();
        let write = ring.write;
        let msg = ring.slots[write].take();
        ring.write = (write + slots - 1) % slots;
        msg
    }

    /// Number of unread messages.
    pub fn available(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if there is nothing to read.
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Discard every unread message.
    pub fn flush(&self) {
        let mut ring = self.lock();
        ring.limit = ring.write;
        for slot in ring.slots.iter_mut() {
            *slot = None;
        }
    }

    /// Maximum number of unread messages kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl std::fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBuffer")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}
