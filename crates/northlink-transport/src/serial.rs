use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{LinkMode, SerialLink};

/// Serial device link to the radio dongle.
///
/// The port handle is cloned once so the inbound worker's reads never wait
/// behind the outbound worker's writes.
pub struct SerialPortLink {
    reader: Mutex<Box<dyn SerialPort>>,
    writer: Mutex<Box<dyn SerialPort>>,
    port_name: String,
    connected: AtomicBool,
}

impl SerialPortLink {
    /// Baud rate the dongle firmware runs at.
    pub const DEFAULT_BAUD: u32 = 115_200;
    /// Driver-level timeout for a single blocking read or write.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

    /// Open `port` at the default baud rate.
    pub fn open(port: &str) -> Result<Self> {
        Self::open_with_baud(port, Self::DEFAULT_BAUD)
    }

    /// Open `port` at an explicit baud rate.
    pub fn open_with_baud(port: &str, baud: u32) -> Result<Self> {
        let mut builder = serialport::new(port, baud).timeout(Self::DEFAULT_TIMEOUT);
        #[cfg(unix)]
        {
            builder = builder
                .data_bits(serialport::DataBits::Eight)
                .stop_bits(serialport::StopBits::One)
                .parity(serialport::Parity::None);
        }
        let writer = builder.open().map_err(|source| TransportError::Open {
            port: port.to_string(),
            source,
        })?;
        let reader = writer.try_clone()?;

        info!(port, baud, "opened serial link");

        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            port_name: port.to_string(),
            connected: AtomicBool::new(true),
        })
    }

    /// Device path this link was opened on.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn reader(&self) -> MutexGuard<'_, Box<dyn SerialPort>> {
        self.reader.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn writer(&self) -> MutexGuard<'_, Box<dyn SerialPort>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(TransportError::NoConnection)
        }
    }

    /// Record fatal errors so workers observe [`LinkMode::NoConnection`].
    fn observe_io(&self, err: std::io::Error) -> TransportError {
        if matches!(
            err.kind(),
            ErrorKind::BrokenPipe
                | ErrorKind::NotConnected
                | ErrorKind::UnexpectedEof
                | ErrorKind::NotFound
                | ErrorKind::PermissionDenied
        ) {
            warn!(port = %self.port_name, error = %err, "serial link lost");
            self.connected.store(false, Ordering::Release);
        }
        TransportError::Io(err)
    }

    fn observe_port(&self, err: serialport::Error) -> TransportError {
        if matches!(err.kind(), serialport::ErrorKind::NoDevice) {
            warn!(port = %self.port_name, error = %err, "serial device disappeared");
            self.connected.store(false, Ordering::Release);
        }
        TransportError::Port(err)
    }
}

impl SerialLink for SerialPortLink {
    fn receive(&self) -> Result<Option<Bytes>> {
        self.ensure_connected()?;
        let mut port = self.reader();
        let waiting = port.bytes_to_read().map_err(|e| self.observe_port(e))? as usize;
        if waiting == 0 {
            return Ok(None);
        }
        let mut buf = vec![0u8; waiting];
        let read = match port.read(&mut buf) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::TimedOut => 0,
            Err(err) if err.kind() == ErrorKind::Interrupted => 0,
            Err(err) => return Err(self.observe_io(err)),
        };
        if read == 0 {
            return Ok(None);
        }
        buf.truncate(read);
        Ok(Some(Bytes::from(buf)))
    }

    fn transmit(&self, data: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        let mut port = self.writer();
        port.write_all(data).map_err(|e| self.observe_io(e))?;
        port.flush().map_err(|e| self.observe_io(e))
    }

    fn read_exact(&self, n: usize) -> Result<Bytes> {
        self.ensure_connected()?;
        let mut buf = vec![0u8; n];
        let mut filled = 0usize;
        let mut port = self.reader();
        while filled < n {
            match port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => break,
                Err(err) => return Err(self.observe_io(err)),
            }
        }
        if filled < n {
            return Err(TransportError::ShortRead {
                expected: n,
                actual: filled,
            });
        }
        Ok(Bytes::from(buf))
    }

    fn bytes_waiting(&self) -> Result<usize> {
        self.ensure_connected()?;
        let waiting = self
            .reader()
            .bytes_to_read()
            .map_err(|e| self.observe_port(e))?;
        Ok(waiting as usize)
    }

    fn drain(&self) -> Result<()> {
        self.ensure_connected()?;
        let port = self.reader();
        port.clear(ClearBuffer::Input)
            .map_err(|e| self.observe_port(e))?;
        debug!(port = %self.port_name, "drained receive buffer");
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
        if self.connected.swap(false, Ordering::AcqRel) {
            info!(port = %self.port_name, "closed serial link");
        }
    }
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("port", &self.port_name)
            .field("mode", &self.mode())
            .finish()
    }
}
