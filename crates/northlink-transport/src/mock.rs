//! In-memory link for tests and simulations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::{LinkMode, SerialLink};

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

/// Mock serial link.
///
/// Received bytes are injected with [`MockLink::inject`]; every transmit call
/// is recorded and can optionally be answered by a responder closure that
/// plays the remote side.
///
/// ```
/// use northlink_transport::mock::MockLink;
/// use northlink_transport::SerialLink;
///
/// let link = MockLink::new();
/// link.inject(b"hello");
/// assert_eq!(link.bytes_waiting().unwrap(), 5);
///
/// link.transmit(b"world").unwrap();
/// assert_eq!(link.transmitted(), vec![b"world".to_vec()]);
/// ```
pub struct MockLink {
    rx: Mutex<VecDeque<u8>>,
    tx: Mutex<Vec<Vec<u8>>>,
    responder: Mutex<Option<Responder>>,
    connected: AtomicBool,
}

impl MockLink {
    /// Create a ready link with empty buffers.
    pub fn new() -> Self {
        Self {
            rx: Mutex::new(VecDeque::new()),
            tx: Mutex::new(Vec::new()),
            responder: Mutex::new(None),
            connected: AtomicBool::new(true),
        }
    }

    /// Queue bytes as if the dongle had sent them.
    pub fn inject(&self, data: &[u8]) {
        lock(&self.rx).extend(data.iter().copied());
    }

    /// Every transmit call so far, one entry per call.
    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        lock(&self.tx).clone()
    }

    /// Take and clear the transmit log.
    pub fn take_transmitted(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *lock(&self.tx))
    }

    /// Answer each transmitted chunk with the bytes the closure returns.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        *lock(&self.responder) = Some(Box::new(responder));
    }

    /// Force the reported link state.
    pub fn set_mode(&self, mode: LinkMode) {
        self.connected
            .store(mode == LinkMode::Ready, Ordering::Release);
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(TransportError::NoConnection)
        }
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink for MockLink {
    fn receive(&self) -> Result<Option<Bytes>> {
        self.ensure_connected()?;
        let mut rx = lock(&self.rx);
        if rx.is_empty() {
            return Ok(None);
        }
        let data: Vec<u8> = rx.drain(..).collect();
        Ok(Some(Bytes::from(data)))
    }

    fn transmit(&self, data: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        lock(&self.tx).push(data.to_vec());

        let reply = match lock(&self.responder).as_mut() {
            Some(responder) => responder(data),
            None => None,
        };
        if let Some(reply) = reply {
            self.inject(&reply);
        }
        Ok(())
    }

    fn read_exact(&self, n: usize) -> Result<Bytes> {
        self.ensure_connected()?;
        let mut rx = lock(&self.rx);
        if rx.len() < n {
            return Err(TransportError::ShortRead {
                expected: n,
                actual: rx.len(),
            });
        }
        let data: Vec<u8> = rx.drain(..n).collect();
        Ok(Bytes::from(data))
    }

    fn bytes_waiting(&self) -> Result<usize> {
        self.ensure_connected()?;
        Ok(lock(&self.rx).len())
    }

    fn drain(&self) -> Result<()> {
        self.ensure_connected()?;
        lock(&self.rx).clear();
        Ok(())
    }

    fn mode(&self) -> LinkMode {
        if self.connected.load(Ordering::Acquire) {
            LinkMode::Ready
        } else {
            LinkMode::NoConnection
        }
    }

    fn close(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for MockLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLink")
            .field("pending", &lock(&self.rx).len())
            .field("transmitted", &lock(&self.tx).len())
            .field("mode", &self.mode())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
