//! Broker-agnostic description of exchanges, queues, bindings and
//! publishings. Grounded on `original_source/queue.go`'s `Exchange`/`Queue`
//! value-object shapes, generalised into free-standing constructors rather
//! than the Go file's pointer-returning package functions.

use bytes::Bytes;

/// Seconds-to-milliseconds TTL applied to reply queues so an undelivered
/// result is eventually reclaimed by the broker (`original_source`'s
/// `ReplyQueueTTL`, 24 hours).
pub const REPLY_QUEUE_TTL_MS: u32 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub name: String,
    pub kind: String,
    pub durable: bool,
    pub auto_delete: bool,
}

/// A durable, non-auto-deleting `direct` exchange. Every exchange this
/// worker declares is `direct` (spec.md §3).
#[must_use]
pub fn durable_exchange(name: impl Into<String>) -> Exchange {
    Exchange {
        name: name.into(),
        kind: "direct".to_string(),
        durable: true,
        auto_delete: false,
    }
}

/// The broker's nameless default exchange, used as the reply-publish target.
/// It is never declared, only published/bound through — the `durable` flag
/// here is cosmetic and ignored by the broker for this exchange.
#[must_use]
pub fn default_exchange() -> Exchange {
    durable_exchange("")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue {
    pub name: String,
    pub durable: bool,
    pub auto_delete: bool,
    /// Milliseconds, `0` meaning "no expiry".
    pub ttl_ms: u32,
}

/// The long-lived work queue a worker consumes from.
#[must_use]
pub fn durable_queue(name: impl Into<String>) -> Queue {
    Queue {
        name: name.into(),
        durable: true,
        auto_delete: false,
        ttl_ms: 0,
    }
}

/// A per-task reply queue: non-durable, auto-delete, and TTL-bounded so a
/// result nobody collects doesn't linger forever.
#[must_use]
pub fn expiring_reply_queue(name: impl Into<String>) -> Queue {
    Queue {
        name: name.into(),
        durable: false,
        auto_delete: true,
        ttl_ms: REPLY_QUEUE_TTL_MS,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub routing_key: String,
    pub queue: Queue,
    pub exchange: Exchange,
}

#[must_use]
pub fn binding(exchange: Exchange, queue: Queue, routing_key: impl Into<String>) -> Binding {
    Binding {
        routing_key: routing_key.into(),
        queue,
        exchange,
    }
}

#[derive(Debug, Clone)]
pub struct Publishing {
    pub routing_key: String,
    pub exchange: Exchange,
    pub body: Bytes,
}

#[must_use]
pub fn publishing(exchange: Exchange, routing_key: impl Into<String>, body: impl Into<Bytes>) -> Publishing {
    Publishing {
        routing_key: routing_key.into(),
        exchange,
        body: body.into(),
    }
}
