//! Phases (a)-(c) of the broker consumer: own the connection, run the
//! outer consume-retry loop, and decode each delivery onto the internal
//! deliveries channel. Grounded on `empath-smtp/src/listener.rs`'s
//! accept-loop shape (outer loop around a fallible "get me a stream of
//! things" call, spawn a lightweight task per item).

use std::{sync::Arc, time::Duration};

use stevedore_broker::{topology::Queue, Connection, Message, Receipt};
use stevedore_common::broker;
use stevedore_proto::TaskEnvelope;
use tokio::sync::mpsc;

use crate::error::WorkerError;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Converts configured concurrency into a broker prefetch count.
///
/// # Errors
/// Returns [`WorkerError::ZeroConcurrency`] if `concurrency` is `0` — a
/// worker with no prefetch would never be handed a delivery to dispatch.
pub fn prefetch_from_concurrency(concurrency: usize) -> Result<u16, WorkerError> {
    if concurrency == 0 {
        return Err(WorkerError::ZeroConcurrency);
    }
    Ok(u16::try_from(concurrency).unwrap_or(u16::MAX))
}

/// A decoded task paired with the receipt for the delivery it came from.
pub struct DecodedTask {
    pub task: TaskEnvelope,
    pub receipt: Receipt,
}

pub struct Consumer {
    connection: Arc<Connection>,
    queue: Queue,
    prefetch: u16,
}

impl Consumer {
    #[must_use]
    pub fn new(connection: Arc<Connection>, queue: Queue, prefetch: u16) -> Self {
        Self {
            connection,
            queue,
            prefetch,
        }
    }

    /// Runs the outer consume-retry loop forever, pushing decoded tasks
    /// onto `deliveries_tx`. Returns only if the channel's receiver is
    /// dropped (process shutting down).
    pub async fn run(&self, deliveries_tx: mpsc::Sender<DecodedTask>) {
        loop {
            let mut stream = match self.connection.consume(&self.queue, self.prefetch).await {
                Ok(stream) => stream,
                Err(err) => {
                    broker!(level = ERROR, error = %err, "failed to start consuming, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    continue;
                }
            };

            while let Some(message) = stream.recv().await {
                let tx = deliveries_tx.clone();
                tokio::spawn(async move {
                    decode_and_enqueue(message, tx).await;
                });
            }

            broker!(level = WARN, "consumer stream closed, reconnecting");
        }
    }
}

/// Checks content-type, decodes the body, and forwards the result on
/// `deliveries_tx`. Content-type mismatches and decode failures are both
/// terminal here: the delivery is rejected without requeue (spec.md §7 and
/// §9's "pick one, document it" open question — this worker rejects rather
/// than silently dropping, so a misbehaving producer doesn't wedge a queue
/// with messages that are never acknowledged).
async fn decode_and_enqueue(message: Message, deliveries_tx: mpsc::Sender<DecodedTask>) {
    match message.content_type.as_deref() {
        Some("application/json") => {}
        other => {
            broker!(level = WARN, content_type = ?other, "rejecting delivery with unsupported content type");
            if let Err(err) = message.receipt.reject().await {
                broker!(level = ERROR, error = %err, "failed to reject delivery");
            }
            return;
        }
    }

    match TaskEnvelope::decode(&message.body) {
        Ok(task) => {
            broker!(level = DEBUG, task = %task.task, id = %task.id, "decoded task");
            let decoded = DecodedTask {
                task,
                receipt: message.receipt,
            };
            // The receiver is only ever dropped at process shutdown; if
            // that's already happened, dropping `decoded` here leaves the
            // receipt un-acked so the broker redelivers it.
            let _ = deliveries_tx.send(decoded).await;
        }
        Err(err) => {
            broker!(level = WARN, error = %err, "rejecting undecodable task body");
            if let Err(err) = message.receipt.reject().await {
                broker!(level = ERROR, error = %err, "failed to reject delivery");
            }
        }
    }
}
