use std::time::{Duration, Instant};

use northlink_frame::ntrp::{PAIR_MARKER, SYNC_MARKER};
use northlink_transport::SerialLink;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Upper bound on buffered handshake text before old text is dropped.
const MAX_SYNC_TEXT: usize = 256;

/// Configuration for the link handshake.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Give up if the sync marker has not appeared within this time.
    pub timeout: Duration,
    /// Sleep between polls while nothing is pending.
    pub tick: Duration,
    /// Wait after sending the pair marker before draining stale bytes.
    pub settle: Duration,
    /// Text the dongle repeats while waiting for a host.
    pub sync_marker: String,
    /// Reply that completes the handshake.
    pub pair_marker: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            tick: Duration::from_millis(1),
            settle: Duration::from_millis(300),
            sync_marker: SYNC_MARKER.to_string(),
            pair_marker: PAIR_MARKER.to_string(),
        }
    }
}

/// Result of a handshake attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The dongle is paired and the receive buffer is clean.
    Synced { elapsed: Duration },
    /// The sync marker never appeared.
    TimedOut { elapsed: Duration },
}

impl SyncOutcome {
    /// Returns true if the handshake completed.
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }

    /// Time spent in the handshake.
    pub fn elapsed(&self) -> Duration {
        match self {
            SyncOutcome::Synced { elapsed } | SyncOutcome::TimedOut { elapsed } => *elapsed,
        }
    }
}

/// Align with the dongle before any framed traffic.
///
/// Polls the link until the sync marker shows up in the received text,
/// answers with the pair marker, waits for the dongle to settle and drains
/// whatever arrived meanwhile. A timeout is reported as
/// [`SyncOutcome::TimedOut`], not as an error; only link failures are errors.
pub fn synchronize<L: SerialLink + ?Sized>(link: &L, config: &SyncConfig) -> Result<SyncOutcome> {
    let started = Instant::now();
    let mut text = String::new();

    loop {
        if started.elapsed() >= config.timeout {
            warn!(timeout = ?config.timeout, "radio handshake timed out");
            return Ok(SyncOutcome::TimedOut {
                elapsed: started.elapsed(),
            });
        }

        match link.receive()? {
            Some(bytes) => {
                text.push_str(&String::from_utf8_lossy(&bytes));
                if text.contains(config.sync_marker.as_str()) {
                    break;
                }
                trim_front(&mut text, config.sync_marker.len());
            }
            None => std::thread::sleep(config.tick),
        }
    }

    debug!("sync marker received, pairing");
    link.transmit(config.pair_marker.as_bytes())?;
    std::thread::sleep(config.settle);
    link.drain()?;

    let elapsed = started.elapsed();
    info!(?elapsed, "radio synchronized");
    Ok(SyncOutcome::Synced { elapsed })
}

/// Keep only the tail that could still hold the start of a marker.
fn trim_front(text: &mut String, marker_len: usize) {
    if text.len() <= MAX_SYNC_TEXT {
        return;
    }
    let mut cut = text.len().saturating_sub(marker_len);
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.drain(..cut);
}
