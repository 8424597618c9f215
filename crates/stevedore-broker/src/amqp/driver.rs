//! The bundled AMQP [`Driver`]. Grounded on
//! `examples/other_examples/..p2p-org-rust-utils..message_consumer.rs` for
//! the `tokio-executor-trait`/`tokio-reactor-trait` wiring and consumer loop
//! shape, and on `..rustus..amqp_notifier.rs` for the declare/bind/publish
//! call shapes. The failover/round-robin/reconnect behaviour is this
//! worker's own (spec.md §4.3), not copied from either.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, RwLock,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use lapin::{options::BasicConsumeOptions, options::BasicQosOptions, types::FieldTable, Channel, Connection, ConnectionProperties};
use stevedore_common::broker;
use tokio::sync::{mpsc, oneshot};

use crate::{
    driver::{Driver, Message, MessageReceiver, Receipt, ReceiptOps},
    error::BrokerError,
    topology::{Binding, Exchange, Publishing, Queue},
    transport::Transport,
};

use super::writer::{self, WriterRequest};

struct AmqpState {
    #[allow(dead_code)] // kept alive for the duration of the connection
    connection: Connection,
    channel: Channel,
    writer_tx: mpsc::UnboundedSender<WriterRequest>,
}

pub struct AmqpDriver {
    uris: Vec<String>,
    next_uri: AtomicUsize,
    alive: Arc<AtomicBool>,
    state: RwLock<Option<AmqpState>>,
}

impl AmqpDriver {
    #[must_use]
    pub fn new(uris: Vec<String>) -> Self {
        Self {
            uris,
            next_uri: AtomicUsize::new(0),
            alive: Arc::new(AtomicBool::new(false)),
            state: RwLock::new(None),
        }
    }

    fn pick_uri(&self) -> &str {
        let index = self.next_uri.fetch_add(1, Ordering::SeqCst) % self.uris.len();
        &self.uris[index]
    }

    fn writer_tx(&self) -> Result<mpsc::UnboundedSender<WriterRequest>, BrokerError> {
        self.state
            .read()
            .expect("amqp driver state lock poisoned")
            .as_ref()
            .map(|state| state.writer_tx.clone())
            .ok_or(BrokerError::NotConnected)
    }

    fn channel(&self) -> Result<Channel, BrokerError> {
        self.state
            .read()
            .expect("amqp driver state lock poisoned")
            .as_ref()
            .map(|state| state.channel.clone())
            .ok_or(BrokerError::NotConnected)
    }
}

#[async_trait]
impl Driver for AmqpDriver {
    async fn connect(&self) -> Result<(), BrokerError> {
        if self.uris.is_empty() {
            return Err(BrokerError::NoUris);
        }
        if self.alive.load(Ordering::SeqCst) {
            return Ok(());
        }

        let uri = self.pick_uri().to_string();
        broker!(level = DEBUG, uri = %uri, "dialing broker");

        let properties = ConnectionProperties::default()
            .with_executor(tokio_executor_trait::Tokio::current())
            .with_reactor(tokio_reactor_trait::Tokio);

        let connection = Connection::connect(&uri, properties).await?;
        let channel = connection.create_channel().await?;
        let writer_tx = writer::spawn(channel.clone());

        *self.state.write().expect("amqp driver state lock poisoned") = Some(AmqpState {
            connection,
            channel,
            writer_tx,
        });
        self.alive.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn declare_exchange(&self, exchange: &Exchange) -> Result<(), BrokerError> {
        let (tx, rx) = oneshot::channel();
        self.writer_tx()?
            .send(WriterRequest::DeclareExchange {
                exchange: exchange.clone(),
                respond_to: tx,
            })
            .map_err(|_| BrokerError::WriterGone)?;
        rx.await.map_err(|_| BrokerError::WriterGone)?
    }

    async fn declare_queue(&self, queue: &Queue) -> Result<(), BrokerError> {
        let (tx, rx) = oneshot::channel();
        self.writer_tx()?
            .send(WriterRequest::DeclareQueue {
                queue: queue.clone(),
                respond_to: tx,
            })
            .map_err(|_| BrokerError::WriterGone)?;
        rx.await.map_err(|_| BrokerError::WriterGone)?
    }

    async fn bind(&self, binding: &Binding) -> Result<(), BrokerError> {
        let (tx, rx) = oneshot::channel();
        self.writer_tx()?
            .send(WriterRequest::Bind {
                binding: binding.clone(),
                respond_to: tx,
            })
            .map_err(|_| BrokerError::WriterGone)?;
        rx.await.map_err(|_| BrokerError::WriterGone)?
    }

    async fn publish(&self, publishing: &Publishing) -> Result<(), BrokerError> {
        let (tx, rx) = oneshot::channel();
        self.writer_tx()?
            .send(WriterRequest::Publish {
                publishing: publishing.clone(),
                respond_to: tx,
            })
            .map_err(|_| BrokerError::WriterGone)?;
        rx.await.map_err(|_| BrokerError::WriterGone)?
    }

    async fn get_messages(&self, queue: &Queue, prefetch: u16) -> Result<MessageReceiver, BrokerError> {
        let channel = self.channel()?;
        let writer_tx = self.writer_tx()?;

        channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await?;

        let mut consumer = channel
            .basic_consume(
                &queue.name,
                "",
                BasicConsumeOptions {
                    no_ack: false,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        let (tx, rx) = mpsc::channel(usize::from(prefetch).max(1));
        let alive = Arc::clone(&self.alive);

        tokio::spawn(async move {
            while let Some(delivery) = consumer.next().await {
                let delivery = match delivery {
                    Ok(delivery) => delivery,
                    Err(err) => {
                        broker!(level = WARN, error = %err, "consumer stream ended, marking driver not-alive");
                        alive.store(false, Ordering::SeqCst);
                        return;
                    }
                };

                let content_type = delivery
                    .properties
                    .content_type()
                    .as_ref()
                    .map(ToString::to_string);

                let receipt = Receipt::new(Arc::new(AmqpReceipt::new(
                    delivery.delivery_tag,
                    writer_tx.clone(),
                )));

                let message = Message {
                    content_type,
                    body: Bytes::from(delivery.data),
                    receipt,
                };

                if tx.send(message).await.is_err() {
                    break;
                }
            }

            broker!(level = WARN, "consumer stream closed, marking driver not-alive");
            alive.store(false, Ordering::SeqCst);
        });

        Ok(rx)
    }
}

/// A delivery's one-shot ack/reject/requeue/reply surface, backed by the
/// writer task that owns the consuming channel.
struct AmqpReceipt {
    delivery_tag: u64,
    writer_tx: mpsc::UnboundedSender<WriterRequest>,
    terminated: std::sync::Mutex<bool>,
}

impl AmqpReceipt {
    fn new(delivery_tag: u64, writer_tx: mpsc::UnboundedSender<WriterRequest>) -> Self {
        Self {
            delivery_tag,
            writer_tx,
            terminated: std::sync::Mutex::new(false),
        }
    }

    /// Marks the receipt terminated, returning `false` if it already was
    /// (in which case the caller should treat the call as a silent no-op).
    fn claim_terminal(&self) -> bool {
        let mut terminated = self.terminated.lock().expect("receipt lock poisoned");
        if *terminated {
            false
        } else {
            *terminated = true;
            true
        }
    }

    async fn send_terminal(&self, request: WriterRequest, rx: oneshot::Receiver<Result<(), BrokerError>>) -> Result<(), BrokerError> {
        self.writer_tx
            .send(request)
            .map_err(|_| BrokerError::WriterGone)?;
        rx.await.map_err(|_| BrokerError::WriterGone)?
    }
}

#[async_trait]
impl ReceiptOps for AmqpReceipt {
    async fn ack(&self) -> Result<(), BrokerError> {
        if !self.claim_terminal() {
            return Ok(());
        }
        let (tx, rx) = oneshot::channel();
        self.send_terminal(
            WriterRequest::Ack {
                delivery_tag: self.delivery_tag,
                respond_to: tx,
            },
            rx,
        )
        .await
    }

    async fn reject(&self) -> Result<(), BrokerError> {
        if !self.claim_terminal() {
            return Ok(());
        }
        let (tx, rx) = oneshot::channel();
        self.send_terminal(
            WriterRequest::Reject {
                delivery_tag: self.delivery_tag,
                requeue: false,
                respond_to: tx,
            },
            rx,
        )
        .await
    }

    async fn requeue(&self) -> Result<(), BrokerError> {
        if !self.claim_terminal() {
            return Ok(());
        }
        let (tx, rx) = oneshot::channel();
        self.send_terminal(
            WriterRequest::Reject {
                delivery_tag: self.delivery_tag,
                requeue: true,
                respond_to: tx,
            },
            rx,
        )
        .await
    }

    async fn reply(&self, queue: Queue, body: Bytes) -> Result<(), BrokerError> {
        let (declare_tx, declare_rx) = oneshot::channel();
        self.writer_tx
            .send(WriterRequest::DeclareQueue {
                queue: queue.clone(),
                respond_to: declare_tx,
            })
            .map_err(|_| BrokerError::WriterGone)?;
        declare_rx.await.map_err(|_| BrokerError::WriterGone)??;

        let publishing = Publishing {
            routing_key: queue.name.clone(),
            exchange: crate::topology::default_exchange(),
            body,
        };
        let (publish_tx, publish_rx) = oneshot::channel();
        self.writer_tx
            .send(WriterRequest::Publish {
                publishing,
                respond_to: publish_tx,
            })
            .map_err(|_| BrokerError::WriterGone)?;
        publish_rx.await.map_err(|_| BrokerError::WriterGone)?
    }
}

pub struct AmqpTransport;

impl Transport for AmqpTransport {
    fn open(&self, uris: Vec<String>) -> Arc<dyn Driver> {
        Arc::new(AmqpDriver::new(uris))
    }
}
