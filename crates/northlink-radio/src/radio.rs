use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use northlink_frame::ntrp::{MASTER_ID, ROUTER_ID};
use northlink_frame::{
    Abandon, Codec, FrameConfig, FrameReader, HeaderKind, Message, NtrpCodec, ReadOutcome,
};
use northlink_transport::{LinkMode, SerialLink};
use tracing::{debug, info, trace, warn};

use crate::error::{RadioError, Result};
use crate::pipe::Pipe;
use crate::stats::{RadioStats, StatsSnapshot};
use crate::sync::{synchronize, SyncConfig, SyncOutcome};

/// Pipe addresses are allocated above this value (the router's id).
pub const PIPE_ADDRESS_BASELINE: u8 = ROUTER_ID;

/// Observer for free-text messages from the link.
pub type TextLogHook = Arc<dyn Fn(&Message) + Send + Sync>;

/// Configuration for the radio engine.
#[derive(Debug, Clone)]
pub struct RadioConfig {
    /// Talker id stamped on everything this engine sends.
    pub address: u8,
    /// Outbound frames held before senders wait. Default: 5.
    pub send_queue_capacity: usize,
    /// Pause after each transmit so the dongle keeps up. Default: 10 ms.
    pub throttle: Duration,
    /// Frame reassembly settings for the inbound worker.
    pub frame: FrameConfig,
    /// Handshake settings.
    pub sync: SyncConfig,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            address: MASTER_ID,
            send_queue_capacity: 5,
            throttle: Duration::from_millis(10),
            frame: FrameConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

/// Bounded frame queue between senders and the outbound worker.
///
/// Lives for the whole life of the engine, so frames queued while stopped
/// survive a restart.
struct SendQueue {
    frames: Mutex<VecDeque<Bytes>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl SendQueue {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }
}

struct Shared {
    link: Arc<dyn SerialLink>,
    codec: Arc<dyn Codec>,
    config: RadioConfig,
    active: AtomicBool,
    synced: AtomicBool,
    /// Bumped on every start; workers of an older run exit on a mismatch.
    generation: AtomicU64,
    queue: SendQueue,
    pipes: RwLock<Vec<Arc<Pipe>>>,
    text_hook: RwLock<Option<TextLogHook>>,
    stats: RadioStats,
}

impl Shared {
    fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire) && self.link.mode() != LinkMode::NoConnection
    }

    fn worker_running(&self, generation: u64) -> bool {
        self.is_running() && self.generation.load(Ordering::Acquire) == generation
    }

    /// Wake every thread parked on the send queue so it re-checks the run state.
    fn wake_all(&self) {
        let _frames = lock(&self.queue.frames);
        self.queue.not_empty.notify_all();
        self.queue.not_full.notify_all();
    }

    /// Mark the engine stopped after the link went away.
    ///
    /// The handshake has to be redone before the next start.
    fn link_lost(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            self.synced.store(false, Ordering::Release);
            warn!("link lost, radio stopped");
        }
        self.wake_all();
    }

    /// Queue a frame, blocking while the queue is full and the engine runs.
    fn enqueue(&self, frame: Bytes) -> Result<()> {
        let mut frames = lock(&self.queue.frames);
        while frames.len() >= self.queue.capacity {
            if !self.is_running() {
                return Err(RadioError::Stopped);
            }
            frames = self
                .queue
                .not_full
                .wait(frames)
                .unwrap_or_else(PoisonError::into_inner);
        }
        frames.push_back(frame);
        self.queue.not_empty.notify_all();
        Ok(())
    }

    /// Next frame for the outbound worker of `generation`, or `None` once
    /// that run is over.
    fn next_frame(&self, generation: u64) -> Option<Bytes> {
        let mut frames = lock(&self.queue.frames);
        loop {
            if !self.worker_running(generation) {
                return None;
            }
            if let Some(frame) = frames.pop_front() {
                self.queue.not_full.notify_one();
                return Some(frame);
            }
            frames = self
                .queue
                .not_empty
                .wait(frames)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn dispatch(&self, msg: Message) {
        if msg.header.is_text() {
            info!(talker = %char::from(msg.talker), text = %msg.text(), "radio log");
            let hook = self
                .text_hook
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(hook) = hook {
                hook(&msg);
            }
        }

        let pipe = self
            .pipes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|pipe| pipe.id() == msg.talker && pipe.is_active())
            .cloned();

        match pipe {
            Some(pipe) => {
                self.stats.message_routed();
                pipe.deliver(msg);
            }
            None => {
                self.stats.message_dropped();
                trace!(
                    talker = %char::from(msg.talker),
                    header = %msg.header,
                    "no pipe subscribed, dropping message"
                );
            }
        }
    }
}

/// The duplex radio engine.
///
/// Owns the link. After a successful handshake, [`Radio::start`] spawns an
/// outbound worker that drains a bounded send queue at a throttled rate and
/// an inbound worker that reassembles frames and routes each message to the
/// subscribed pipe whose id equals the message's talker.
///
/// If the link goes to [`LinkMode::NoConnection`] the workers exit on their
/// own, the engine reports inactive and a new handshake is needed.
pub struct Radio {
    shared: Arc<Shared>,
    tx_worker: Mutex<Option<JoinHandle<()>>>,
    rx_worker: Mutex<Option<JoinHandle<()>>>,
}

impl Radio {
    /// Create an engine over `link` using the NTRP codec and defaults.
    pub fn new(link: Arc<dyn SerialLink>) -> Self {
        Self::with_config(link, Arc::new(NtrpCodec), RadioConfig::default())
    }

    /// Create an engine with an explicit codec and configuration.
    pub fn with_config(
        link: Arc<dyn SerialLink>,
        codec: Arc<dyn Codec>,
        config: RadioConfig,
    ) -> Self {
        let queue = SendQueue::new(config.send_queue_capacity);
        Self {
            shared: Arc::new(Shared {
                link,
                codec,
                config,
                active: AtomicBool::new(false),
                synced: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                queue,
                pipes: RwLock::new(Vec::new()),
                text_hook: RwLock::new(None),
                stats: RadioStats::default(),
            }),
            tx_worker: Mutex::new(None),
            rx_worker: Mutex::new(None),
        }
    }

    /// Run the link handshake with the configured timeout.
    pub fn synchronize(&self) -> Result<SyncOutcome> {
        self.synchronize_with_timeout(self.shared.config.sync.timeout)
    }

    /// Run the link handshake with an explicit timeout.
    ///
    /// Refused while the workers are running; the handshake needs the link
    /// to itself. Workers left over from a lost link are joined first.
    pub fn synchronize_with_timeout(&self, timeout: Duration) -> Result<SyncOutcome> {
        if self.is_active() {
            return Err(RadioError::AlreadyStarted);
        }
        self.stop();
        let config = SyncConfig {
            timeout,
            ..self.shared.config.sync.clone()
        };
        let outcome = synchronize(self.shared.link.as_ref(), &config)?;
        self.shared
            .synced
            .store(outcome.is_synced(), Ordering::Release);
        Ok(outcome)
    }

    /// Spawn the inbound and outbound workers.
    pub fn start(&self) -> Result<()> {
        if !self.shared.synced.load(Ordering::Acquire) {
            return Err(RadioError::NotSynchronized);
        }
        if self.shared.link.mode() == LinkMode::NoConnection {
            return Err(RadioError::NoConnection);
        }
        if self.is_active() {
            return Err(RadioError::AlreadyStarted);
        }
        self.join_workers();

        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.shared.active.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let tx = std::thread::Builder::new()
            .name("northlink-tx".to_string())
            .spawn(move || run_outbound(shared, generation));
        let tx = match tx {
            Ok(handle) => handle,
            Err(err) => {
                self.shared.active.store(false, Ordering::Release);
                return Err(northlink_transport::TransportError::Io(err).into());
            }
        };
        *lock(&self.tx_worker) = Some(tx);

        let shared = Arc::clone(&self.shared);
        let rx = std::thread::Builder::new()
            .name("northlink-rx".to_string())
            .spawn(move || run_inbound(shared, generation));
        match rx {
            Ok(handle) => *lock(&self.rx_worker) = Some(handle),
            Err(err) => {
                self.stop();
                return Err(northlink_transport::TransportError::Io(err).into());
            }
        }

        info!(address = %char::from(self.shared.config.address), generation, "radio started");
        Ok(())
    }

    /// Stop both workers and wait for them to exit.
    ///
    /// Queued frames that were not transmitted stay queued for the next
    /// [`Radio::start`], which needs a fresh handshake first. Safe to call
    /// from a message handler; the calling worker is left to exit by itself.
    pub fn stop(&self) {
        let was_active = self.shared.active.swap(false, Ordering::AcqRel);
        self.shared.wake_all();
        self.join_workers();

        self.shared.synced.store(false, Ordering::Release);
        if was_active {
            info!("radio stopped");
        }
    }

    fn join_workers(&self) {
        for (slot, worker) in [(&self.tx_worker, "outbound"), (&self.rx_worker, "inbound")] {
            let Some(handle) = lock(slot).take() else {
                continue;
            };
            if is_current(handle.thread()) {
                debug!(worker, "stopped from the worker's own thread; not joining");
            } else if handle.join().is_err() {
                warn!(worker, "worker panicked");
            }
        }
    }

    /// Stop the workers and close the link.
    pub fn close(&self) {
        self.stop();
        self.shared.link.close();
    }

    /// Whether the workers are running: started, not stopped, and the link
    /// still up.
    pub fn is_active(&self) -> bool {
        self.shared.is_running()
    }

    /// Whether the last handshake succeeded.
    pub fn is_synchronized(&self) -> bool {
        self.shared.synced.load(Ordering::Acquire)
    }

    /// Current link state.
    pub fn link_mode(&self) -> LinkMode {
        self.shared.link.mode()
    }

    /// Engine configuration.
    pub fn config(&self) -> &RadioConfig {
        &self.shared.config
    }

    /// This engine's own address.
    pub fn address(&self) -> u8 {
        self.shared.config.address
    }

    /// Worker counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Observe free-text messages before they are routed.
    pub fn set_text_hook(&self, hook: TextLogHook) {
        *self
            .shared
            .text_hook
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }

    /// Send a message to a pipe.
    ///
    /// Stamps talker = this engine and receiver = the pipe, encodes, and
    /// enqueues. Waits while the queue is full.
    pub fn send_pipe(&self, pipe: &Pipe, msg: Message) -> Result<()> {
        self.send_to(pipe.id(), msg)
    }

    /// Send a message to an arbitrary receiver id.
    pub fn send_to(&self, receiver: u8, msg: Message) -> Result<()> {
        let msg = msg.with_route(self.shared.config.address, receiver);
        let frame = self.shared.codec.encode(&msg)?;
        trace!(
            receiver = %char::from(receiver),
            header = %msg.header,
            data_id = msg.data_id,
            "queueing message"
        );
        self.shared.enqueue(frame)
    }

    /// Add a pipe to the routing set.
    pub fn subscribe(&self, pipe: Arc<Pipe>) -> Result<()> {
        let mut pipes = self
            .shared
            .pipes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if pipes.iter().any(|p| p.id() == pipe.id()) {
            warn!(pipe = %char::from(pipe.id()), "pipe address already subscribed");
            return Err(RadioError::DuplicateAddress(char::from(pipe.id())));
        }
        debug!(pipe = %char::from(pipe.id()), address = pipe.address(), "subscribed pipe");
        pipes.push(pipe);
        Ok(())
    }

    /// Remove the first pipe with this id from the routing set.
    pub fn unsubscribe(&self, id: u8) -> Option<Arc<Pipe>> {
        let mut pipes = self
            .shared
            .pipes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let index = pipes.iter().position(|p| p.id() == id)?;
        debug!(pipe = %char::from(id), "unsubscribed pipe");
        Some(pipes.remove(index))
    }

    /// Look up a subscribed pipe.
    pub fn pipe(&self, id: u8) -> Option<Arc<Pipe>> {
        self.shared
            .pipes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.id() == id)
            .cloned()
    }

    /// Ids of all subscribed pipes.
    pub fn pipe_ids(&self) -> Vec<u8> {
        self.shared
            .pipes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|p| p.id())
            .collect()
    }

    /// An id strictly greater than every subscribed pipe id.
    pub fn allocate_new_pipe_address(&self) -> Result<u8> {
        let pipes = self
            .shared
            .pipes
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        next_address(&pipes)
    }

    /// Assign a fresh id and subscribe, without telling the dongle yet.
    pub fn register_pipe(&self, mut pipe: Pipe) -> Result<Arc<Pipe>> {
        let mut pipes = self
            .shared
            .pipes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        pipe.set_id(next_address(&pipes)?);
        let pipe = Arc::new(pipe);
        pipes.push(Arc::clone(&pipe));
        debug!(pipe = %char::from(pipe.id()), address = pipe.address(), "registered pipe");
        Ok(pipe)
    }

    /// Assign a fresh id, subscribe, and tell the dongle to open the pipe.
    pub fn open_pipe(&self, pipe: Pipe) -> Result<Arc<Pipe>> {
        let pipe = self.register_pipe(pipe)?;
        if let Err(err) = self.announce_pipe(&pipe) {
            self.unsubscribe(pipe.id());
            return Err(err);
        }
        info!(pipe = %char::from(pipe.id()), address = pipe.address(), "opened pipe");
        Ok(pipe)
    }

    /// Send the router command that opens `pipe` on the dongle.
    ///
    /// Data: channel, speed code, six address bytes.
    pub fn announce_pipe(&self, pipe: &Pipe) -> Result<()> {
        let mut data = Vec::with_capacity(8);
        data.push(pipe.channel());
        data.push(pipe.bandwidth().speed_code());
        data.extend_from_slice(&pipe.address_bytes());
        self.send_to(ROUTER_ID, Message::new(HeaderKind::OpenPipe, pipe.id(), data))
    }

    /// Tell the dongle to close a pipe, unsubscribe and deactivate it.
    pub fn close_pipe(&self, id: u8) -> Result<Option<Arc<Pipe>>> {
        self.send_to(ROUTER_ID, Message::new(HeaderKind::ClosePipe, id, Bytes::new()))?;
        let pipe = self.unsubscribe(id);
        if let Some(pipe) = &pipe {
            pipe.deactivate();
        }
        Ok(pipe)
    }
}

impl Drop for Radio {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Radio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Radio")
            .field("address", &char::from(self.shared.config.address))
            .field("active", &self.is_active())
            .field("synchronized", &self.is_synchronized())
            .field("link", &self.shared.link.mode())
            .finish()
    }
}

fn next_address(pipes: &[Arc<Pipe>]) -> Result<u8> {
    pipes
        .iter()
        .map(|p| p.id())
        .fold(PIPE_ADDRESS_BASELINE, u8::max)
        .checked_add(1)
        .ok_or(RadioError::AddressesExhausted)
}

fn run_outbound(shared: Arc<Shared>, generation: u64) {
    debug!(generation, "outbound worker started");
    while let Some(frame) = shared.next_frame(generation) {
        match shared.link.transmit(&frame) {
            Ok(()) => shared.stats.frame_sent(),
            Err(err) => {
                shared.stats.send_failed();
                warn!(error = %err, "transmit failed");
            }
        }
        std::thread::sleep(shared.config.throttle);
    }
    if shared.link.mode() == LinkMode::NoConnection {
        shared.link_lost();
    }
    debug!(generation, "outbound worker stopped");
}

fn run_inbound(shared: Arc<Shared>, generation: u64) {
    debug!(generation, "inbound worker started");
    let mut reader = FrameReader::with_config(Arc::clone(&shared.link), shared.config.frame.clone());

    while shared.worker_running(generation) {
        match reader.read_frame() {
            Ok(ReadOutcome::Idle) => {}
            Ok(ReadOutcome::Abandoned(Abandon::Noise { discarded })) => {
                shared.stats.bytes_discarded(discarded);
            }
            Ok(ReadOutcome::Abandoned(reason)) => {
                shared.stats.frame_abandoned();
                debug!(?reason, "abandoned frame");
            }
            Ok(ReadOutcome::Frame(raw)) => match shared.codec.decode(&raw) {
                Ok(msg) => {
                    shared.stats.frame_received();
                    shared.dispatch(msg);
                }
                Err(err) => {
                    shared.stats.decode_failed();
                    debug!(raw = ?raw.as_ref(), error = %err, "NAK: undecodable frame");
                    reader.reject(&raw);
                }
            },
            Err(err) => {
                if shared.link.mode() == LinkMode::NoConnection {
                    debug!(error = %err, "link read failed with no connection");
                    break;
                }
                debug!(error = %err, "link read failed");
                std::thread::sleep(shared.config.frame.idle_tick);
            }
        }
    }
    if shared.link.mode() == LinkMode::NoConnection {
        shared.link_lost();
    }
    debug!(generation, "inbound worker stopped");
}

fn is_current(thread: &std::thread::Thread) -> bool {
    thread.id() == std::thread::current().id()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use northlink_transport::mock::MockLink;

    use super::*;
    use crate::pipe::Bandwidth;

    fn pipe(id: u8) -> Arc<Pipe> {
        Arc::new(Pipe::new(76, Bandwidth::Kbps2000, "E7E7E7E301").with_id(id))
    }

    #[test]
    fn start_requires_handshake() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        assert!(matches!(radio.start(), Err(RadioError::NotSynchronized)));
    }

    #[test]
    fn allocate_starts_above_baseline() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        assert_eq!(radio.allocate_new_pipe_address().unwrap(), PIPE_ADDRESS_BASELINE + 1);
    }

    #[test]
    fn allocate_is_above_every_subscribed_id() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        radio.subscribe(pipe(b'7')).unwrap();
        radio.subscribe(pipe(b'3')).unwrap();

        let next = radio.allocate_new_pipe_address().unwrap();
        assert_eq!(next, b'8');
        assert!(radio.pipe_ids().iter().all(|id| *id < next));
    }

    #[test]
    fn allocate_reports_exhaustion() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        radio.subscribe(pipe(u8::MAX)).unwrap();
        assert!(matches!(
            radio.allocate_new_pipe_address(),
            Err(RadioError::AddressesExhausted)
        ));
    }

    #[test]
    fn duplicate_subscription_is_rejected() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        radio.subscribe(pipe(b'2')).unwrap();
        assert!(matches!(
            radio.subscribe(pipe(b'2')),
            Err(RadioError::DuplicateAddress('2'))
        ));
        assert_eq!(radio.pipe_ids(), vec![b'2']);
    }

    #[test]
    fn unsubscribe_removes_first_match() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        radio.subscribe(pipe(b'2')).unwrap();
        radio.subscribe(pipe(b'3')).unwrap();

        let removed = radio.unsubscribe(b'2').unwrap();
        assert_eq!(removed.id(), b'2');
        assert!(radio.unsubscribe(b'2').is_none());
        assert_eq!(radio.pipe_ids(), vec![b'3']);
    }

    #[test]
    fn dispatch_routes_by_talker() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        let two = pipe(b'2');
        let three = pipe(b'3');
        radio.subscribe(Arc::clone(&two)).unwrap();
        radio.subscribe(Arc::clone(&three)).unwrap();

        let msg = Message::new(HeaderKind::Log, 1, vec![1u8]).with_route(b'3', MASTER_ID);
        radio.shared.dispatch(msg.clone());
        assert_eq!(three.inbox().read(), Some(msg));
        assert!(two.inbox().is_empty());

        let stray = Message::new(HeaderKind::Log, 1, vec![1u8]).with_route(b'9', MASTER_ID);
        radio.shared.dispatch(stray);
        assert!(two.inbox().is_empty());
        assert!(three.inbox().is_empty());

        let stats = radio.stats();
        assert_eq!(stats.messages_routed, 1);
        assert_eq!(stats.messages_dropped, 1);
    }

    #[test]
    fn text_messages_reach_hook_before_routing() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        radio.set_text_hook(Arc::new(move |msg: &Message| {
            sink.lock().unwrap().push(msg.text().into_owned());
        }));

        let msg = Message::new(HeaderKind::Msg, 0, b"NRF Pipe Opened".to_vec())
            .with_route(ROUTER_ID, MASTER_ID);
        radio.shared.dispatch(msg);
        assert_eq!(*seen.lock().unwrap(), vec!["NRF Pipe Opened".to_string()]);
    }

    #[test]
    fn send_stamps_route() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        let target = pipe(b'4');
        radio
            .send_pipe(&target, Message::command(1, vec![0u8]))
            .unwrap();

        let frame = lock(&radio.shared.queue.frames)
            .front()
            .cloned()
            .expect("send should leave a queued frame");
        let msg = NtrpCodec.decode(&frame).unwrap();
        assert_eq!(msg.talker, MASTER_ID);
        assert_eq!(msg.receiver, b'4');
    }

    #[test]
    fn full_queue_without_workers_is_an_error() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        let target = pipe(b'4');
        for _ in 0..5 {
            radio.send_pipe(&target, Message::command(1, vec![0u8])).unwrap();
        }
        assert!(matches!(
            radio.send_pipe(&target, Message::command(1, vec![0u8])),
            Err(RadioError::Stopped)
        ));
    }

    #[test]
    fn repeated_stop_keeps_queue_capacity() {
        let radio = Radio::new(Arc::new(MockLink::new()));
        for _ in 0..10 {
            radio.stop();
            radio.close();
        }

        let target = pipe(b'4');
        for _ in 0..5 {
            radio
                .send_pipe(&target, Message::command(1, vec![0u8]))
                .expect("stopping an idle radio should not use queue slots");
        }
        assert_eq!(lock(&radio.shared.queue.frames).len(), 5);
    }

    #[test]
    fn link_loss_clears_running_state() {
        let link = Arc::new(MockLink::new());
        let radio = Radio::new(link.clone());
        radio.shared.active.store(true, Ordering::Release);
        radio.shared.synced.store(true, Ordering::Release);
        assert!(radio.is_active());

        link.set_mode(LinkMode::NoConnection);
        assert!(!radio.is_active());
        radio.shared.link_lost();
        link.set_mode(LinkMode::Ready);

        assert!(!radio.is_active());
        assert!(!radio.is_synchronized());
    }
}
