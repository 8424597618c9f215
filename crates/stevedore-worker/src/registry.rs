//! Process-wide task registry: name → handler. Grounded on
//! `empath-ffi/src/modules/mod.rs`'s `LazyLock<RwLock<..>>` module store —
//! populated once before the dispatch loop starts, read-only thereafter
//! (spec.md §3/§9: no locking needed at steady state, so a plain `RwLock`
//! read is fine rather than a lock-free structure).

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, RwLock},
};

use crate::handler::Handler;

static REGISTRY: LazyLock<RwLock<HashMap<String, Arc<dyn Handler>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register `handler` under `name`, replacing any prior registration for
/// that name.
pub fn register(name: impl Into<String>, handler: Arc<dyn Handler>) {
    REGISTRY
        .write()
        .expect("task registry poisoned")
        .insert(name.into(), handler);
}

/// Look up the handler registered for `name`.
#[must_use]
pub fn lookup(name: &str) -> Option<Arc<dyn Handler>> {
    REGISTRY
        .read()
        .expect("task registry poisoned")
        .get(name)
        .cloned()
}
