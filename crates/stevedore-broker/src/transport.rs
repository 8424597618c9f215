//! The transport registry: maps a URI scheme (`"amqp"`) to a factory that
//! opens a [`Driver`] for it. Grounded on
//! `empath-ffi/src/modules/mod.rs`'s `LazyLock<RwLock<..>>` module store —
//! the same "populate once at start-up, look up by key afterwards" shape,
//! swapped from a `Vec` keyed by name to a `HashMap` keyed by scheme.

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, RwLock},
};

use crate::{driver::Driver, error::BrokerError};

/// Opens a [`Driver`] for one or more failover URIs sharing a scheme.
pub trait Transport: Send + Sync {
    fn open(&self, uris: Vec<String>) -> Arc<dyn Driver>;
}

static TRANSPORTS: LazyLock<RwLock<HashMap<String, Arc<dyn Transport>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register a transport under `scheme`, replacing any prior registration.
pub fn register(scheme: impl Into<String>, transport: Arc<dyn Transport>) {
    TRANSPORTS
        .write()
        .expect("transport registry poisoned")
        .insert(scheme.into(), transport);
}

/// Look up the transport registered for `scheme`.
#[must_use]
pub fn lookup(scheme: &str) -> Option<Arc<dyn Transport>> {
    TRANSPORTS
        .read()
        .expect("transport registry poisoned")
        .get(scheme)
        .cloned()
}

/// Register the transports this crate ships with. Called once from the
/// worker binary's start-up, analogous to `empath-ffi`'s explicit
/// `modules::init()` call rather than a hidden constructor.
pub fn register_builtins() {
    register("amqp", Arc::new(crate::amqp::AmqpTransport));
}

/// Open a driver for `scheme` over `uris`, or [`BrokerError::UnknownTransport`]
/// if nothing is registered for it.
///
/// # Errors
/// Returns [`BrokerError::UnknownTransport`] if `scheme` has no registered
/// transport.
pub fn open(scheme: &str, uris: Vec<String>) -> Result<Arc<dyn Driver>, BrokerError> {
    lookup(scheme)
        .map(|transport| transport.open(uris))
        .ok_or_else(|| BrokerError::UnknownTransport(scheme.to_string()))
}
