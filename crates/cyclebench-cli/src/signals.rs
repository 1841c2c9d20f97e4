//! Signal handling for cooperative shutdown.
//!
//! SIGINT and SIGTERM set a static flag from an async-signal-safe handler;
//! a small poll thread forwards the request into the run's shared stop
//! flag. The sampling loop observes it at its next cycle boundary, so an
//! interrupted run still reports the cycles it completed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use cyclebench_runtime::driver::StopFlag;

static SIGNAL_SEEN: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_stop_signal(_: libc::c_int) {
    // Only an atomic store here: the handler must stay async-signal-safe.
    SIGNAL_SEEN.store(true, Ordering::SeqCst);
}

/// Register SIGINT and SIGTERM handlers that request a cooperative stop.
///
/// Spawns a detached thread that polls the handler flag every 10 ms and
/// forwards it to `stop`; the thread exits once a stop is in effect.
pub fn install(stop: &StopFlag) -> nix::Result<()> {
    use nix::sys::signal::{signal, SigHandler, Signal};

    let handler = SigHandler::Handler(handle_stop_signal);
    // SAFETY: the handler performs a single atomic store, which is safe to
    // run in signal context.
    unsafe {
        signal(Signal::SIGINT, handler)?;
        signal(Signal::SIGTERM, handler)?;
    }

    let stop = stop.clone();
    std::thread::spawn(move || loop {
        if SIGNAL_SEEN.load(Ordering::SeqCst) {
            info!("stop signal received, requesting cooperative stop");
            stop.request_stop();
            break;
        }
        if stop.stop_requested() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    });

    debug!("signal handlers registered for SIGINT and SIGTERM");
    Ok(())
}
