//! Ambient stack shared by every `stevedore` crate: errors, logging, the
//! shutdown signal, and the worker's configuration surface.

pub mod config;
pub mod error;
pub mod logging;

pub use tracing;

/// Broadcast over this worker's shutdown channel.
///
/// `Shutdown` is the first interrupt (begin draining); `Finalised` is sent
/// once every in-flight handler has completed and listeners should stop
/// waiting on the broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
    Finalised,
}
