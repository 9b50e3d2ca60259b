use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use northlink_frame::ntrp::{MASTER_ID, ROUTER_ID, START_BYTE};
use northlink_frame::{Codec, FrameConfig, HeaderKind, Message, NtrpCodec};
use northlink_radio::{
    Bandwidth, Pipe, Radio, RadioConfig, RadioError, RxMode, SyncConfig, PIPE_ADDRESS_BASELINE,
};
use northlink_transport::mock::MockLink;
use northlink_transport::LinkMode;

fn test_config() -> RadioConfig {
    RadioConfig {
        throttle: Duration::from_millis(2),
        frame: FrameConfig {
            byte_timeout: Duration::from_millis(30),
            ..FrameConfig::default()
        },
        sync: SyncConfig {
            timeout: Duration::from_secs(1),
            settle: Duration::from_millis(5),
            ..SyncConfig::default()
        },
        ..RadioConfig::default()
    }
}

fn synced_radio(link: &Arc<MockLink>) -> Radio {
    let radio = Radio::with_config(link.clone(), Arc::new(NtrpCodec), test_config());
    link.inject(b"noise-S-");
    let outcome = radio.synchronize().expect("handshake should not fail");
    assert!(outcome.is_synced(), "mock dongle should pair");
    assert_eq!(link.take_transmitted(), vec![b"-P-".to_vec()]);
    radio
}

fn frame_from(talker: u8, data_id: u8, data: &[u8]) -> Vec<u8> {
    let msg = Message::new(HeaderKind::Log, data_id, data.to_vec()).with_route(talker, MASTER_ID);
    NtrpCodec.encode(&msg).expect("frame should encode").to_vec()
}

fn pipe(id: u8) -> Arc<Pipe> {
    Arc::new(Pipe::new(76, Bandwidth::Kbps2000, Pipe::DEFAULT_ADDRESS).with_id(id))
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn start_without_handshake_is_refused() {
    let link = Arc::new(MockLink::new());
    let radio = Radio::with_config(link.clone(), Arc::new(NtrpCodec), test_config());
    assert!(matches!(radio.start(), Err(RadioError::NotSynchronized)));

    let outcome = radio
        .synchronize_with_timeout(Duration::from_millis(50))
        .expect("timeout is not an error");
    assert!(!outcome.is_synced());
    assert!(matches!(radio.start(), Err(RadioError::NotSynchronized)));
}

#[test]
fn second_start_is_refused() {
    let link = Arc::new(MockLink::new());
    let radio = synced_radio(&link);
    radio.start().expect("radio should start");
    assert!(matches!(radio.start(), Err(RadioError::AlreadyStarted)));
    radio.stop();
}

#[test]
fn inbound_frames_are_routed_by_talker() {
    let link = Arc::new(MockLink::new());
    let radio = synced_radio(&link);
    let two = pipe(b'2');
    let three = pipe(b'3');
    radio.subscribe(two.clone()).expect("pipe 2 should subscribe");
    radio.subscribe(three.clone()).expect("pipe 3 should subscribe");
    radio.start().expect("radio should start");

    link.inject(&frame_from(b'3', 7, &[1, 2]));
    link.inject(&frame_from(b'2', 8, &[3]));
    link.inject(&frame_from(b'9', 9, &[4]));

    assert!(wait_until(Duration::from_secs(2), || {
        radio.stats().frames_received == 3
    }));
    radio.stop();

    let for_three = three.inbox().read().expect("pipe 3 should have a message");
    assert_eq!(for_three.talker, b'3');
    assert_eq!(for_three.data_id, 7);
    assert_eq!(for_three.payload.as_ref(), &[1, 2]);
    assert!(three.inbox().is_empty());

    let for_two = two.inbox().read().expect("pipe 2 should have a message");
    assert_eq!(for_two.data_id, 8);
    assert!(two.inbox().is_empty());

    let stats = radio.stats();
    assert_eq!(stats.messages_routed, 2);
    assert_eq!(stats.messages_dropped, 1);
}

#[test]
fn callback_pipes_see_messages_on_the_worker() {
    let link = Arc::new(MockLink::new());
    let radio = synced_radio(&link);
    let two = pipe(b'2');
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    two.set_handler(Arc::new(move |msg: Message| {
        sink.lock().unwrap().push(msg.data_id);
    }));
    two.set_rx_mode(RxMode::Callback);
    radio.subscribe(two.clone()).expect("pipe should subscribe");
    radio.start().expect("radio should start");

    link.inject(&frame_from(b'2', 1, &[]));
    link.inject(&frame_from(b'2', 2, &[]));

    assert!(wait_until(Duration::from_secs(2), || seen.lock().unwrap().len() == 2));
    radio.stop();
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert!(two.inbox().is_empty());
}

#[test]
fn queued_messages_are_sent_once_in_order() {
    let link = Arc::new(MockLink::new());
    let radio = synced_radio(&link);
    radio.start().expect("radio should start");

    let target = pipe(b'2');
    for data_id in 0..8u8 {
        radio
            .send_pipe(&target, Message::command(data_id, vec![data_id]))
            .expect("send should queue");
    }

    assert!(wait_until(Duration::from_secs(2), || link.transmitted().len() == 8));
    thread::sleep(Duration::from_millis(50));
    radio.stop();

    let sent = link.transmitted();
    assert_eq!(sent.len(), 8, "every message goes out exactly once");
    let ids: Vec<u8> = sent
        .iter()
        .map(|raw| {
            let msg = NtrpCodec.decode(raw).expect("sent frame should decode");
            assert_eq!(msg.talker, MASTER_ID);
            assert_eq!(msg.receiver, b'2');
            msg.data_id
        })
        .collect();
    assert_eq!(ids, (0..8).collect::<Vec<u8>>());
    assert_eq!(radio.stats().frames_sent, 8);
}

#[test]
fn truncated_frame_does_not_swallow_the_next_one() {
    let link = Arc::new(MockLink::new());
    let radio = synced_radio(&link);
    let two = pipe(b'2');
    radio.subscribe(two.clone()).expect("pipe should subscribe");
    radio.start().expect("radio should start");

    // Declares ten packet bytes but only two arrive before the next frame.
    let mut stream = vec![START_BYTE, b'2', MASTER_ID, 10, HeaderKind::Log as u8, 1];
    stream.extend_from_slice(&frame_from(b'2', 5, &[1, 2, 3, 4]));
    link.inject(&stream);

    assert!(wait_until(Duration::from_secs(2), || !two.inbox().is_empty()));
    radio.stop();

    let msg = two.inbox().read().expect("second frame should be delivered");
    assert_eq!(msg.data_id, 5);
    assert_eq!(msg.payload.as_ref(), &[1, 2, 3, 4]);
    assert!(two.inbox().is_empty());
}

#[test]
fn text_messages_reach_the_log_hook() {
    let link = Arc::new(MockLink::new());
    let radio = synced_radio(&link);
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = lines.clone();
    radio.set_text_hook(Arc::new(move |msg: &Message| {
        sink.lock().unwrap().push(msg.text().into_owned());
    }));
    radio.start().expect("radio should start");

    let msg = Message::new(HeaderKind::Msg, 0, b"NRF ready".to_vec()).with_route(ROUTER_ID, MASTER_ID);
    link.inject(&NtrpCodec.encode(&msg).expect("frame should encode"));

    assert!(wait_until(Duration::from_secs(2), || !lines.lock().unwrap().is_empty()));
    radio.stop();
    assert_eq!(*lines.lock().unwrap(), vec!["NRF ready".to_string()]);
}

#[test]
fn open_pipe_allocates_and_announces() {
    let link = Arc::new(MockLink::new());
    let radio = synced_radio(&link);
    radio.start().expect("radio should start");

    let first = radio
        .open_pipe(Pipe::new(76, Bandwidth::Kbps2000, "E7E7E7E301"))
        .expect("first pipe should open");
    let second = radio
        .open_pipe(Pipe::new(80, Bandwidth::Kbps250, "E7E7E7E302"))
        .expect("second pipe should open");
    assert_eq!(first.id(), PIPE_ADDRESS_BASELINE + 1);
    assert_eq!(second.id(), PIPE_ADDRESS_BASELINE + 2);

    assert!(wait_until(Duration::from_secs(2), || link.transmitted().len() == 2));
    let announce = NtrpCodec
        .decode(&link.transmitted()[0])
        .expect("announce should decode");
    assert_eq!(announce.header, HeaderKind::OpenPipe);
    assert_eq!(announce.receiver, ROUTER_ID);
    assert_eq!(announce.data_id, first.id());
    assert_eq!(
        announce.payload.as_ref(),
        &[76, 2, 0xE7, 0xE7, 0xE7, 0xE3, 0x01, 0x00]
    );

    let closed = radio
        .close_pipe(first.id())
        .expect("close should queue")
        .expect("pipe should be subscribed");
    assert!(!closed.is_active());
    assert_eq!(radio.pipe_ids(), vec![second.id()]);

    assert!(wait_until(Duration::from_secs(2), || link.transmitted().len() == 3));
    radio.stop();
    let close = NtrpCodec
        .decode(&link.transmitted()[2])
        .expect("close should decode");
    assert_eq!(close.header, HeaderKind::ClosePipe);
    assert_eq!(close.data_id, first.id());
}

#[test]
fn link_loss_stops_the_workers() {
    let link = Arc::new(MockLink::new());
    let radio = synced_radio(&link);
    radio.start().expect("radio should start");

    link.set_mode(LinkMode::NoConnection);
    assert!(
        wait_until(Duration::from_secs(1), || !radio.is_synchronized()),
        "workers should notice the lost link"
    );
    assert!(!radio.is_active());

    let target = pipe(b'2');
    let mut refused = false;
    for data_id in 0..16u8 {
        if let Err(err) = radio.send_pipe(&target, Message::command(data_id, vec![])) {
            assert!(matches!(err, RadioError::Stopped));
            refused = true;
            break;
        }
    }
    assert!(refused, "a full queue with no worker must not block forever");
    assert!(link.transmitted().is_empty());

    link.set_mode(LinkMode::Ready);
    assert!(!radio.is_active(), "a returning link needs a new handshake");
    assert!(matches!(radio.start(), Err(RadioError::NotSynchronized)));

    link.inject(b"-S-");
    let outcome = radio.synchronize().expect("handshake should run after link loss");
    assert!(outcome.is_synced());
    radio.start().expect("radio should restart after a new handshake");
    assert!(wait_until(Duration::from_secs(1), || link.transmitted().len() == 6));

    let sent = link.take_transmitted();
    assert_eq!(sent[0], b"-P-".to_vec());
    let ids: Vec<u8> = sent[1..]
        .iter()
        .map(|raw| NtrpCodec.decode(raw).expect("queued frame should decode").data_id)
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    radio.stop();
}

#[test]
fn blocked_sender_is_released_by_stop() {
    let link = Arc::new(MockLink::new());
    let config = RadioConfig {
        throttle: Duration::from_millis(200),
        ..test_config()
    };
    let radio = Arc::new(Radio::with_config(link.clone(), Arc::new(NtrpCodec), config));
    link.inject(b"-S-");
    assert!(radio.synchronize().expect("handshake should not fail").is_synced());
    radio.start().expect("radio should start");

    let sender = {
        let radio = Arc::clone(&radio);
        thread::spawn(move || {
            let target = pipe(b'2');
            (0..20u8)
                .map(|data_id| radio.send_pipe(&target, Message::command(data_id, vec![])))
                .find(Result::is_err)
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(!sender.is_finished(), "sender should wait for queue space");

    radio.stop();
    let outcome = sender.join().expect("sender thread should not panic");
    assert!(matches!(outcome, Some(Err(RadioError::Stopped))));
}

#[test]
fn stop_from_a_handler_allows_restart() {
    let link = Arc::new(MockLink::new());
    let radio = Arc::new(synced_radio(&link));
    radio.start().expect("radio should start");

    let target = Pipe::new(76, Bandwidth::Kbps2000, Pipe::DEFAULT_ADDRESS).with_id(b'2');
    let weak = Arc::downgrade(&radio);
    target.set_handler(Arc::new(move |_msg: Message| {
        if let Some(radio) = weak.upgrade() {
            radio.stop();
        }
    }));
    target.set_rx_mode(RxMode::Callback);
    radio.subscribe(Arc::new(target)).expect("subscribe should succeed");

    link.inject(&frame_from(b'2', 1, &[7]));
    assert!(wait_until(Duration::from_secs(1), || !radio.is_active()));

    link.inject(b"-S-");
    assert!(radio.synchronize().expect("handshake should run").is_synced());
    radio.start().expect("radio should restart");
    radio
        .send_to(ROUTER_ID, Message::command(9, vec![]))
        .expect("send should queue after restart");
    assert!(wait_until(Duration::from_secs(1), || link.transmitted().len() == 2));
    radio.stop();
}
