use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use northlink_frame::{HeaderKind, Message};
use northlink_radio::{MessageHandler, Pipe, Radio, RadioUri, RxMode};
use tracing::{debug, info, warn};

use crate::error::{CommandError, Result};
use crate::params::{ParamTable, ParameterEntry, ParameterStore};

/// Command data id: parameter table content.
pub const CMD_PARAM_CONTENT: u8 = 1;

/// Command data id: function table content.
pub const CMD_FUNCTION_CONTENT: u8 = 2;

/// Configuration for a [`Commander`].
#[derive(Debug, Clone)]
pub struct CommanderConfig {
    /// Wait after each request before polling for the reply. Default: 10 ms.
    pub poll_interval: Duration,
    /// Consecutive misses tolerated before a warning. Default: 50.
    pub miss_warn_threshold: u32,
    /// Handshake timeout used by [`Commander::connect_default`]. Default: 30 s.
    pub connect_timeout: Duration,
    /// Give up synchronizing after this many requests. Default: never.
    pub max_requests: Option<u64>,
}

impl Default for CommanderConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            miss_warn_threshold: 50,
            connect_timeout: Duration::from_secs(30),
            max_requests: None,
        }
    }
}

/// Counters from one table synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries now in the table.
    pub entries: usize,
    /// Requests sent, including retries.
    pub requests: u64,
    /// Polls that found no reply.
    pub misses: u64,
}

struct CommanderState<S> {
    table: Mutex<S>,
}

impl<S> CommanderState<S> {
    fn table(&self) -> MutexGuard<'_, S> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: ParameterStore> MessageHandler for CommanderState<S> {
    fn handle(&self, msg: Message) {
        match msg.header {
            HeaderKind::Ack => info!(data_id = msg.data_id, "ACK"),
            HeaderKind::Nak => info!(data_id = msg.data_id, "NAK"),
            HeaderKind::Cmd => {
                if msg.data_id == CMD_PARAM_CONTENT {
                    self.table().append(&msg.payload);
                } else {
                    debug!(data_id = msg.data_id, "ignoring command");
                }
            }
            HeaderKind::Set | HeaderKind::Log => {
                let mut table = self.table();
                match table.get_mut(msg.data_id) {
                    Some(entry) => entry.set_value(&msg.payload),
                    None => warn!(index = msg.data_id, "parameter not found in table"),
                }
            }
            HeaderKind::Msg => info!(text = %msg.text(), "vehicle message"),
            HeaderKind::OpenPipe | HeaderKind::ClosePipe | HeaderKind::Exit => {
                debug!(header = %msg.header, "unexpected router command from vehicle");
            }
        }
    }
}

/// Parameter and command channel to one vehicle.
///
/// Owns a pipe on a shared [`Radio`]. Inbound messages are handled on the
/// radio's inbound worker in callback mode, except while
/// [`Commander::synchronize`] polls the pipe's inbox.
pub struct Commander<S: ParameterStore = ParamTable> {
    radio: Arc<Radio>,
    pipe: Arc<Pipe>,
    state: Arc<CommanderState<S>>,
    config: CommanderConfig,
    connected: AtomicBool,
    table_ready: AtomicBool,
}

impl Commander<ParamTable> {
    /// Register a pipe for `uri` on `radio` with an empty [`ParamTable`].
    pub fn new(radio: Arc<Radio>, uri: &RadioUri) -> Result<Self> {
        Self::with_store(radio, uri, ParamTable::new(), CommanderConfig::default())
    }
}

impl<S: ParameterStore> Commander<S> {
    /// Register a pipe for `uri` on `radio` backed by `store`.
    pub fn with_store(
        radio: Arc<Radio>,
        uri: &RadioUri,
        store: S,
        config: CommanderConfig,
    ) -> Result<Self> {
        let pipe = radio.register_pipe(uri.pipe())?;
        let state = Arc::new(CommanderState {
            table: Mutex::new(store),
        });
        pipe.set_handler(state.clone());
        pipe.set_rx_mode(RxMode::Callback);
        debug!(pipe = %char::from(pipe.id()), %uri, "commander pipe registered");

        Ok(Self {
            radio,
            pipe,
            state,
            config,
            connected: AtomicBool::new(false),
            table_ready: AtomicBool::new(false),
        })
    }

    /// [`Commander::connect`] with the configured timeout.
    pub fn connect_default(&self) -> Result<()> {
        self.connect(self.config.connect_timeout)
    }

    /// Handshake, start the radio, and announce this commander's pipe.
    ///
    /// A handshake timeout is not an error; check [`Commander::is_connected`].
    /// If the radio is already running the handshake is skipped. After a lost
    /// link the radio reports inactive, so the handshake runs again.
    pub fn connect(&self, timeout: Duration) -> Result<()> {
        if !self.radio.is_active() {
            let outcome = self.radio.synchronize_with_timeout(timeout)?;
            if !outcome.is_synced() {
                warn!(?timeout, "vehicle link not established");
                self.connected.store(false, Ordering::Release);
                return Ok(());
            }
            self.radio.start()?;
        }
        self.radio.announce_pipe(&self.pipe)?;
        self.connected.store(true, Ordering::Release);
        info!(pipe = %char::from(self.pipe.id()), "connected");
        Ok(())
    }

    /// Whether the last [`Commander::connect`] succeeded and the radio is
    /// still running.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && self.radio.is_active()
    }

    /// Pull the whole parameter table from the vehicle.
    ///
    /// Requests index 0, 1, ... one at a time until the vehicle acknowledges
    /// instead of answering. A request with no reply after the poll interval
    /// is a miss and is repeated. The table is cleared first.
    pub fn synchronize(&self) -> Result<SyncReport> {
        if !self.is_connected() {
            return Err(CommandError::NotConnected);
        }
        self.table_ready.store(false, Ordering::Release);
        self.pipe.set_rx_mode(RxMode::Buffered);
        let result = self.pull_table();
        self.pipe.set_rx_mode(RxMode::Callback);

        let report = result?;
        self.table_ready.store(true, Ordering::Release);
        info!(
            entries = report.entries,
            requests = report.requests,
            misses = report.misses,
            "parameter table synchronized"
        );
        Ok(report)
    }

    fn pull_table(&self) -> Result<SyncReport> {
        self.state.table().clear();

        let inbox = self.pipe.inbox();
        let mut index: u8 = 0;
        let mut requests = 0u64;
        let mut misses = 0u64;
        let mut streak = 0u32;

        loop {
            if let Some(limit) = self.config.max_requests {
                if requests >= limit {
                    return Err(CommandError::SyncAborted {
                        requests,
                        entries: self.state.table().len(),
                    });
                }
            }

            // Replies are read newest first; stale ones must not answer this request.
            inbox.flush();
            self.radio
                .send_pipe(&self.pipe, Message::command(CMD_PARAM_CONTENT, vec![index]))?;
            requests += 1;
            std::thread::sleep(self.config.poll_interval);

            let Some(msg) = inbox.read() else {
                misses += 1;
                streak += 1;
                if streak == self.config.miss_warn_threshold.saturating_add(1) {
                    warn!(misses = streak, index, "too many missing command replies");
                }
                continue;
            };
            streak = 0;

            match msg.header {
                HeaderKind::Ack => break,
                HeaderKind::Cmd if msg.data_id == CMD_PARAM_CONTENT => {
                    self.state.table().append(&msg.payload);
                    debug!(index, "parameter received");
                    index = index.checked_add(1).ok_or(CommandError::TableOverflow)?;
                }
                _ => debug!(header = %msg.header, data_id = msg.data_id, "ignoring reply"),
            }
        }

        Ok(SyncReport {
            entries: self.state.table().len(),
            requests,
            misses,
        })
    }

    /// Send a new value for an existing parameter and record it locally.
    pub fn push_param(&self, index: u8, value: &[u8]) -> Result<()> {
        if self.state.table().get_mut(index).is_none() {
            return Err(CommandError::UnknownParameter(index));
        }
        self.radio.send_pipe(
            &self.pipe,
            Message::new(HeaderKind::Set, index, value.to_vec()),
        )?;
        if let Some(entry) = self.state.table().get_mut(index) {
            entry.set_value(value);
        }
        Ok(())
    }

    /// Whether the last [`Commander::synchronize`] completed.
    pub fn is_table_ready(&self) -> bool {
        self.table_ready.load(Ordering::Acquire)
    }

    /// Run `f` with the parameter table locked.
    pub fn with_table<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.table())
    }

    /// The commander's pipe.
    pub fn pipe(&self) -> &Arc<Pipe> {
        &self.pipe
    }

    /// The shared radio.
    pub fn radio(&self) -> &Arc<Radio> {
        &self.radio
    }

    /// Tell the dongle to close this commander's pipe.
    pub fn close(&self) -> Result<()> {
        self.connected.store(false, Ordering::Release);
        self.radio.close_pipe(self.pipe.id())?;
        Ok(())
    }
}
