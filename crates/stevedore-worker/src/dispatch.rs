//! Phases (d)-(e): the dispatch loop and per-task handler invocation.
//! Outstanding work is tracked with a `tokio::task::JoinSet` rather than a
//! hand-rolled wait-group — grounded on `empath-smtp::Listener::serve`'s
//! `Vec<JoinHandle>` + `join_all` shutdown shape, generalised to a
//! `JoinSet` so `join_next` doubles as the zero-wait counter spec.md §9
//! calls for.

use std::time::{Duration, Instant};

use stevedore_broker::topology::expiring_reply_queue;
use stevedore_common::{dispatch, Signal};
use stevedore_proto::ResultEnvelope;
use tokio::{sync::broadcast, sync::mpsc, task::JoinSet};

use crate::{consumer::DecodedTask, handler::HandlerError, registry};

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Reads decoded tasks from `deliveries_rx` and spawns a bounded-by-prefetch
/// set of handler invocations, until a [`Signal::Shutdown`] arrives on
/// `shutdown`. Stops pulling new tasks at that point and returns once every
/// already-spawned invocation has completed.
pub async fn run(mut deliveries_rx: mpsc::Receiver<DecodedTask>, mut shutdown: broadcast::Receiver<Signal>) {
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut draining = false;

    loop {
        tokio::select! {
            sig = shutdown.recv(), if !draining => {
                if matches!(sig, Ok(Signal::Shutdown)) {
                    dispatch!(level = DEBUG, "dispatch loop draining outstanding work");
                    draining = true;
                }
            }
            maybe = deliveries_rx.recv(), if !draining => {
                match maybe {
                    Some(decoded) => { tasks.spawn(handle_one(decoded)); }
                    None => break,
                }
            }
            Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(err) = result {
                    dispatch!(level = ERROR, error = %err, "handler task panicked");
                }
            }
            else => {
                if draining {
                    break;
                }
            }
        }
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(err) = result {
            dispatch!(level = ERROR, error = %err, "handler task panicked during drain");
        }
    }

    // Mirrors `src/listener.rs`'s `SHUTDOWN_BROADCAST.send(Signal::Finalised)`
    // after its own drain loop: only announce completion if we actually
    // drained in response to a shutdown signal, not because the deliveries
    // channel closed on its own.
    if draining {
        let _ = crate::shutdown::SHUTDOWN_BROADCAST.send(Signal::Finalised);
    }
}

async fn handle_one(decoded: DecodedTask) {
    let DecodedTask { task, receipt } = decoded;

    let Some(handler) = registry::lookup(&task.task) else {
        dispatch!(level = ERROR, task = %task.task, id = %task.id, "unknown task name");
        if let Err(err) = receipt.reject().await {
            dispatch!(level = ERROR, error = %err, "failed to reject unknown-task delivery");
        }
        return;
    };

    let started = Instant::now();
    let outcome = handler.call(&task).await;
    dispatch!(level = DEBUG, task = %task.task, id = %task.id, elapsed = ?started.elapsed(), "handler completed");

    match outcome {
        Ok(Some(value)) => {
            let reply_queue = expiring_reply_queue(task.reply_queue_name());
            let envelope = ResultEnvelope::success(task.id, value);
            match envelope.encode() {
                Ok(body) => {
                    if let Err(err) = receipt.reply(reply_queue, body.into()).await {
                        dispatch!(level = ERROR, error = %err, "failed to publish reply");
                    }
                }
                Err(err) => dispatch!(level = ERROR, error = %err, "failed to encode result envelope"),
            }
            if let Err(err) = receipt.ack().await {
                dispatch!(level = ERROR, error = %err, "failed to ack delivery");
            }
        }
        Ok(None) => {
            if let Err(err) = receipt.ack().await {
                dispatch!(level = ERROR, error = %err, "failed to ack delivery");
            }
        }
        Err(HandlerError::Retry) => {
            tokio::time::sleep(RETRY_DELAY).await;
            if let Err(err) = receipt.requeue().await {
                dispatch!(level = ERROR, error = %err, "failed to requeue delivery");
            }
        }
        Err(HandlerError::Failed(err)) => {
            dispatch!(level = ERROR, error = %err, task = %task.task, "handler failed");
            if let Err(err) = receipt.reject().await {
                dispatch!(level = ERROR, error = %err, "failed to reject delivery");
            }
        }
    }
}
