//! Interrupt-driven graceful shutdown. Grounded directly on
//! `src/controller.rs`'s `SHUTDOWN_BROADCAST`/`shutdown()` pair: a
//! process-wide broadcast of [`Signal`], a first `ctrl_c` that broadcasts
//! `Signal::Shutdown`, a second that forces an exit. The one addition over
//! the teacher's version is the hard `std::process::exit(1)` on the second
//! signal, required by spec.md §6's exit-code contract (the teacher's
//! `shutdown()` only breaks its own wait loop, since its callers don't need
//! a distinct forced-exit code).

use std::sync::{
    atomic::{AtomicBool, Ordering},
    LazyLock,
};

use stevedore_common::{internal, Signal};
use tokio::sync::broadcast;

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(16);
    sender
});

static DRAINING: AtomicBool = AtomicBool::new(false);

#[must_use]
pub fn is_draining() -> bool {
    DRAINING.load(Ordering::SeqCst)
}

/// Waits for the first interrupt, flips the drain flag and broadcasts
/// [`Signal::Shutdown`] to wake any `tokio::select!` loop subscribed to
/// [`SHUTDOWN_BROADCAST`], then waits for a second interrupt to force an
/// immediate, non-zero exit.
pub async fn watch_for_interrupt() {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }

    internal!(level = WARN, "interrupt received, draining outstanding work (press again to force exit)");
    DRAINING.store(true, Ordering::SeqCst);
    let _ = SHUTDOWN_BROADCAST.send(Signal::Shutdown);

    if tokio::signal::ctrl_c().await.is_ok() {
        internal!(level = ERROR, "second interrupt received, exiting immediately with unacked work");
        std::process::exit(1);
    }
}
