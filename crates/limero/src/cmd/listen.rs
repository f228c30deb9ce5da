use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use limero_msg::{LinkConfig, LinkStats, Message};
use limero_serial::{FrameReader, SerialError};
use tracing::{debug, info};

use crate::cmd::ListenArgs;
use crate::exit::{io_error, serial_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, print_stats, OutputFormat};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What the receive thread reports back to the printing loop.
enum Event {
    Received {
        msg: Message,
        frame_len: usize,
        stats: LinkStats,
    },
    Closed(LinkStats),
    OpenFailed(std::io::Error),
    Failed(SerialError),
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    // opening a FIFO and reading an idle line both block; the loop below
    // keeps polling the stop flag meanwhile
    let (tx, rx) = mpsc::channel();
    let path = args.path.clone();
    let config = LinkConfig::symmetric(args.max_frame);
    thread::Builder::new()
        .name("limero-rx".into())
        .spawn(move || receive_loop(path, config, tx))
        .map_err(|err| CliError::new(INTERNAL, format!("receive thread failed to start: {err}")))?;

    let mut printed = 0usize;
    let mut stats = LinkStats::default();

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(Event::Received {
                msg,
                frame_len,
                stats: latest,
            }) => {
                stats = latest;
                print_message(&msg, frame_len, None, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            Ok(Event::Closed(latest)) => {
                stats = latest;
                info!("end of stream");
                break;
            }
            Ok(Event::OpenFailed(err)) => return Err(io_error("open failed", err)),
            Ok(Event::Failed(err)) => return Err(serial_error("receive failed", err)),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    if !running.load(Ordering::SeqCst) {
        debug!("interrupted");
    }

    info!(
        received = stats.frames_received,
        garbled = stats.garbled,
        malformed = stats.malformed,
        overflowed = stats.overflowed,
        dropped = stats.dropped,
        "listen finished"
    );
    if args.stats {
        print_stats(&stats, format);
    }
    Ok(SUCCESS)
}

fn open_input(path: Option<&Path>) -> std::io::Result<Box<dyn Read>> {
    match path {
        None => Ok(Box::new(std::io::stdin().lock())),
        Some(path) if path == Path::new("-") => Ok(Box::new(std::io::stdin().lock())),
        Some(path) => Ok(Box::new(File::open(path)?)),
    }
}

fn receive_loop(path: Option<PathBuf>, config: LinkConfig, tx: Sender<Event>) {
    let input = match open_input(path.as_deref()) {
        Ok(input) => input,
        Err(err) => {
            let _ = tx.send(Event::OpenFailed(err));
            return;
        }
    };
    let mut reader = FrameReader::with_config(input, config);
    loop {
        let event = match reader.read_message() {
            Ok(msg) => Event::Received {
                msg,
                frame_len: reader.last_frame_len(),
                stats: reader.stats(),
            },
            Err(SerialError::ConnectionClosed) => {
                let _ = tx.send(Event::Closed(reader.stats()));
                return;
            }
            Err(err) => {
                let _ = tx.send(Event::Failed(err));
                return;
            }
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
