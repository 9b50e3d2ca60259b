use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use northlink_frame::Message;
use northlink_radio::Radio;
use northlink_transport::LinkMode;

use crate::cmd::{open_radio, parse_duration, MonitorArgs};
use crate::exit::{radio_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, TIMEOUT};
use crate::output::{print_text, OutputFormat};

const POLL: Duration = Duration::from_millis(100);

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.link.timeout)?;
    let radio = open_radio(&args.link)?;

    let outcome = radio
        .synchronize_with_timeout(timeout)
        .map_err(|err| radio_error("handshake failed", err))?;
    if !outcome.is_synced() {
        radio.close();
        return Err(CliError::new(
            TIMEOUT,
            format!("no answer from dongle on {} within {timeout:?}", args.link.port),
        ));
    }

    let (tx, rx) = mpsc::channel::<Message>();
    radio.set_text_hook(Arc::new(move |msg: &Message| {
        let _ = tx.send(msg.clone());
    }));
    radio
        .start()
        .map_err(|err| radio_error("start failed", err))?;
    radio
        .open_pipe(args.link.uri.pipe())
        .map_err(|err| radio_error("open pipe failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let result = print_until_stopped(&radio, &rx, &running, args.count, format);
    radio.close();
    result
}

fn print_until_stopped(
    radio: &Radio,
    rx: &mpsc::Receiver<Message>,
    running: &AtomicBool,
    count: Option<usize>,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL) {
            Ok(msg) => {
                print_text(&msg, format);
                printed = printed.saturating_add(1);
                if count.is_some_and(|count| printed >= count) {
                    return Ok(SUCCESS);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if radio.link_mode() == LinkMode::NoConnection {
                    return Err(CliError::new(FAILURE, "link lost"));
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
