//! The transport-agnostic [`Driver`] trait and the delivery types it hands
//! back to callers. Concrete transports (the bundled `amqp` one, or any
//! future one registered through [`crate::transport`]) implement this.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{
    error::BrokerError,
    topology::{Binding, Exchange, Publishing, Queue},
};

pub type MessageReceiver = mpsc::Receiver<Message>;

/// One delivered message: its declared content type (if any), raw body, and
/// the [`Receipt`] that disposes of it.
#[derive(Debug)]
pub struct Message {
    pub content_type: Option<String>,
    pub body: Bytes,
    pub receipt: Receipt,
}

/// The four broker-side operations a delivered message supports, behind a
/// driver-owned handle. `ack`/`reject`/`requeue` are mutually exclusive and
/// terminal: exactly one of them is expected per message (spec.md §8), and a
/// duplicate terminal call is silently dropped rather than erroring. `reply`
/// is not terminal — it may be called once, before the terminal call, to
/// publish a result ahead of acking.
#[async_trait]
pub trait ReceiptOps: Send + Sync {
    async fn ack(&self) -> Result<(), BrokerError>;
    async fn reject(&self) -> Result<(), BrokerError>;
    async fn requeue(&self) -> Result<(), BrokerError>;
    async fn reply(&self, queue: Queue, body: Bytes) -> Result<(), BrokerError>;
}

#[derive(Clone)]
pub struct Receipt(Arc<dyn ReceiptOps>);

impl std::fmt::Debug for Receipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Receipt(..)")
    }
}

impl Receipt {
    #[must_use]
    pub fn new(inner: Arc<dyn ReceiptOps>) -> Self {
        Self(inner)
    }

    pub async fn ack(&self) -> Result<(), BrokerError> {
        self.0.ack().await
    }

    pub async fn reject(&self) -> Result<(), BrokerError> {
        self.0.reject().await
    }

    pub async fn requeue(&self) -> Result<(), BrokerError> {
        self.0.requeue().await
    }

    /// Declare `queue` and publish `body` to it through the default
    /// exchange, routed by the queue's own name. Completes synchronously so
    /// a caller that awaits this before calling `ack` is guaranteed the
    /// broker observed the reply first (spec.md §8).
    pub async fn reply(&self, queue: Queue, body: Bytes) -> Result<(), BrokerError> {
        self.0.reply(queue, body).await
    }
}

/// A transport driver: owns connection state for one broker (or
/// broker-failover set) and performs the handful of AMQP-ish operations this
/// worker needs.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn connect(&self) -> Result<(), BrokerError>;

    async fn is_connected(&self) -> bool;

    async fn declare_exchange(&self, exchange: &Exchange) -> Result<(), BrokerError>;

    async fn declare_queue(&self, queue: &Queue) -> Result<(), BrokerError>;

    async fn bind(&self, binding: &Binding) -> Result<(), BrokerError>;

    async fn publish(&self, publishing: &Publishing) -> Result<(), BrokerError>;

    /// Start consuming `queue` with the broker-level prefetch set to
    /// `prefetch`, returning a channel of decoded deliveries.
    async fn get_messages(&self, queue: &Queue, prefetch: u16) -> Result<MessageReceiver, BrokerError>;
}
