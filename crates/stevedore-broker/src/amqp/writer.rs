//! The writer task: the single owner of outbound writes on an AMQP channel.
//! Every mutating operation (declare, bind, publish, ack, reject) is sent
//! here as a request and processed one at a time, so that a reply-then-ack
//! pair is guaranteed to reach the broker in that order even though it's
//! issued from concurrent dispatch-pool tasks (spec.md §9 Design Notes).

use std::time::{SystemTime, UNIX_EPOCH};

use lapin::{
    options::{
        BasicAckOptions, BasicPublishOptions, BasicRejectOptions, ExchangeDeclareOptions,
        QueueBindOptions, QueueDeclareOptions,
    },
    types::{AMQPValue, FieldTable, ShortString},
    BasicProperties, Channel, ExchangeKind,
};
use stevedore_common::broker;
use tokio::sync::{mpsc, oneshot};

use crate::{
    error::BrokerError,
    topology::{Binding, Exchange, Publishing, Queue},
};

pub enum WriterRequest {
    DeclareExchange {
        exchange: Exchange,
        respond_to: oneshot::Sender<Result<(), BrokerError>>,
    },
    DeclareQueue {
        queue: Queue,
        respond_to: oneshot::Sender<Result<(), BrokerError>>,
    },
    Bind {
        binding: Binding,
        respond_to: oneshot::Sender<Result<(), BrokerError>>,
    },
    Publish {
        publishing: Publishing,
        respond_to: oneshot::Sender<Result<(), BrokerError>>,
    },
    Ack {
        delivery_tag: u64,
        respond_to: oneshot::Sender<Result<(), BrokerError>>,
    },
    Reject {
        delivery_tag: u64,
        requeue: bool,
        respond_to: oneshot::Sender<Result<(), BrokerError>>,
    },
}

pub fn spawn(channel: Channel) -> mpsc::UnboundedSender<WriterRequest> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run(channel, rx));
    tx
}

async fn run(channel: Channel, mut rx: mpsc::UnboundedReceiver<WriterRequest>) {
    while let Some(request) = rx.recv().await {
        match request {
            WriterRequest::DeclareExchange { exchange, respond_to } => {
                let result = declare_exchange(&channel, &exchange).await;
                let _ = respond_to.send(result);
            }
            WriterRequest::DeclareQueue { queue, respond_to } => {
                let result = declare_queue(&channel, &queue).await;
                let _ = respond_to.send(result);
            }
            WriterRequest::Bind { binding, respond_to } => {
                let result = bind(&channel, &binding).await;
                let _ = respond_to.send(result);
            }
            WriterRequest::Publish { publishing, respond_to } => {
                let result = publish(&channel, &publishing).await;
                let _ = respond_to.send(result);
            }
            WriterRequest::Ack { delivery_tag, respond_to } => {
                let result = channel
                    .basic_ack(delivery_tag, BasicAckOptions::default())
                    .await
                    .map_err(BrokerError::from);
                let _ = respond_to.send(result);
            }
            WriterRequest::Reject {
                delivery_tag,
                requeue,
                respond_to,
            } => {
                let result = channel
                    .basic_reject(delivery_tag, BasicRejectOptions { requeue })
                    .await
                    .map_err(BrokerError::from);
                let _ = respond_to.send(result);
            }
        }
    }
    broker!(level = WARN, "amqp writer task shutting down: request channel closed");
}

async fn declare_exchange(channel: &Channel, exchange: &Exchange) -> Result<(), BrokerError> {
    if exchange.name.is_empty() {
        // The default exchange is implicit and can't be declared.
        return Ok(());
    }
    channel
        .exchange_declare(
            &exchange.name,
            ExchangeKind::Custom(exchange.kind.clone()),
            ExchangeDeclareOptions {
                durable: exchange.durable,
                auto_delete: exchange.auto_delete,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(Into::into)
}

async fn declare_queue(channel: &Channel, queue: &Queue) -> Result<(), BrokerError> {
    let mut arguments = FieldTable::default();
    if queue.ttl_ms > 0 {
        arguments.insert(
            ShortString::from("x-expires"),
            AMQPValue::LongInt(i32::try_from(queue.ttl_ms).unwrap_or(i32::MAX)),
        );
    }
    channel
        .queue_declare(
            &queue.name,
            QueueDeclareOptions {
                durable: queue.durable,
                auto_delete: queue.auto_delete,
                ..QueueDeclareOptions::default()
            },
            arguments,
        )
        .await
        .map(|_| ())
        .map_err(Into::into)
}

async fn bind(channel: &Channel, binding: &Binding) -> Result<(), BrokerError> {
    channel
        .queue_bind(
            &binding.queue.name,
            &binding.exchange.name,
            &binding.routing_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(Into::into)
}

async fn publish(channel: &Channel, publishing: &Publishing) -> Result<(), BrokerError> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();

    let properties = BasicProperties::default()
        .with_content_type(ShortString::from("application/json"))
        .with_delivery_mode(2)
        .with_timestamp(timestamp);
    channel
        .basic_publish(
            &publishing.exchange.name,
            &publishing.routing_key,
            BasicPublishOptions::default(),
            &publishing.body,
            properties,
        )
        .await
        .map_err(BrokerError::from)
        .map(|_| ())
}
