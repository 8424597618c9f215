use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use stevedore_broker::{topology::Queue, BrokerError, Receipt, ReceiptOps};
use stevedore_common::Signal;
use stevedore_proto::{CeleryValue, TaskEnvelope};
use stevedore_worker::{consumer::DecodedTask, dispatch, handler::HandlerError, registry, Handler};
use tokio::sync::{broadcast, mpsc, Notify};
use uuid::Uuid;

#[derive(Default)]
struct FakeReceiptState {
    acked: bool,
    rejected: bool,
    requeued: bool,
    replies: Vec<(Queue, Bytes)>,
}

struct FakeReceipt(Mutex<FakeReceiptState>);

impl FakeReceipt {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(FakeReceiptState::default())))
    }
}

#[async_trait]
impl ReceiptOps for FakeReceipt {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.0.lock().unwrap().acked = true;
        Ok(())
    }
    async fn reject(&self) -> Result<(), BrokerError> {
        self.0.lock().unwrap().rejected = true;
        Ok(())
    }
    async fn requeue(&self) -> Result<(), BrokerError> {
        self.0.lock().unwrap().requeued = true;
        Ok(())
    }
    async fn reply(&self, queue: Queue, body: Bytes) -> Result<(), BrokerError> {
        self.0.lock().unwrap().replies.push((queue, body));
        Ok(())
    }
}

enum Outcome {
    Success(CeleryValue),
    Null,
    Retry,
    Fail,
}

struct FakeHandler {
    outcome: Outcome,
}

#[async_trait]
impl Handler for FakeHandler {
    async fn call(&self, _task: &TaskEnvelope) -> Result<Option<CeleryValue>, HandlerError> {
        match &self.outcome {
            Outcome::Success(value) => Ok(Some(value.clone())),
            Outcome::Null => Ok(None),
            Outcome::Retry => Err(HandlerError::Retry),
            Outcome::Fail => Err(HandlerError::Failed(anyhow::anyhow!("handler exploded"))),
        }
    }
}

fn task_envelope(name: &str) -> TaskEnvelope {
    TaskEnvelope {
        task: name.to_string(),
        id: Uuid::new_v4(),
        args: Vec::new(),
        kwargs: BTreeMap::new(),
        retries: 0,
        eta: None,
        expires: None,
    }
}

/// Drives one decoded task through `dispatch::run`, signalling shutdown as
/// soon as the handler starts so the run loop drains and returns promptly.
async fn run_one(task_name: &str, handler: Arc<dyn Handler>, receipt_state: Arc<FakeReceipt>) {
    let started = Arc::new(Notify::new());
    registry::register(
        task_name,
        Arc::new(WaitingHandler {
            inner: handler,
            started: started.clone(),
        }),
    );

    let (deliveries_tx, deliveries_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(4);

    deliveries_tx
        .send(DecodedTask {
            task: task_envelope(task_name),
            receipt: Receipt::new(receipt_state),
        })
        .await
        .unwrap();

    let run_handle = tokio::spawn(dispatch::run(deliveries_rx, shutdown_rx));

    started.notified().await;
    shutdown_tx.send(Signal::Shutdown).unwrap();

    tokio::time::timeout(Duration::from_secs(5), run_handle)
        .await
        .expect("dispatch::run did not finish")
        .expect("dispatch::run panicked");
}

struct WaitingHandler {
    inner: Arc<dyn Handler>,
    started: Arc<Notify>,
}

#[async_trait]
impl Handler for WaitingHandler {
    async fn call(&self, task: &TaskEnvelope) -> Result<Option<CeleryValue>, HandlerError> {
        let result = self.inner.call(task).await;
        self.started.notify_one();
        result
    }
}

#[tokio::test]
async fn success_with_value_replies_then_acks() {
    let receipt_state = FakeReceipt::new();
    let handler = Arc::new(FakeHandler {
        outcome: Outcome::Success(CeleryValue::Number(3.0)),
    });

    run_one("test.success", handler, receipt_state.clone()).await;

    let state = receipt_state.0.lock().unwrap();
    assert!(state.acked);
    assert!(!state.rejected);
    assert_eq!(state.replies.len(), 1);
}

#[tokio::test]
async fn null_result_acks_without_reply() {
    let receipt_state = FakeReceipt::new();
    let handler = Arc::new(FakeHandler {
        outcome: Outcome::Null,
    });

    run_one("test.null", handler, receipt_state.clone()).await;

    let state = receipt_state.0.lock().unwrap();
    assert!(state.acked);
    assert!(state.replies.is_empty());
}

#[tokio::test(start_paused = true)]
async fn retry_requeues_after_delay() {
    let receipt_state = FakeReceipt::new();
    let handler = Arc::new(FakeHandler {
        outcome: Outcome::Retry,
    });

    run_one("test.retry", handler, receipt_state.clone()).await;

    let state = receipt_state.0.lock().unwrap();
    assert!(state.requeued);
    assert!(!state.acked);
    assert!(state.replies.is_empty());
}

#[tokio::test]
async fn handler_failure_rejects_without_requeue() {
    let receipt_state = FakeReceipt::new();
    let handler = Arc::new(FakeHandler {
        outcome: Outcome::Fail,
    });

    run_one("test.fail", handler, receipt_state.clone()).await;

    let state = receipt_state.0.lock().unwrap();
    assert!(state.rejected);
    assert!(!state.acked);
    assert!(!state.requeued);
}

#[tokio::test]
async fn unknown_task_name_rejects_without_invoking_any_handler() {
    let receipt_state = FakeReceipt::new();

    let (deliveries_tx, deliveries_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(4);

    deliveries_tx
        .send(DecodedTask {
            task: task_envelope("test.definitely-not-registered"),
            receipt: Receipt::new(receipt_state.clone()),
        })
        .await
        .unwrap();

    let run_handle = tokio::spawn(dispatch::run(deliveries_rx, shutdown_rx));

    // No handler runs for an unknown task, so there's nothing to notify on;
    // give the spawned dispatch task a moment to process the one delivery
    // before signalling shutdown.
    tokio::task::yield_now().await;
    shutdown_tx.send(Signal::Shutdown).unwrap();

    tokio::time::timeout(Duration::from_secs(5), run_handle)
        .await
        .expect("dispatch::run did not finish")
        .expect("dispatch::run panicked");

    let state = receipt_state.0.lock().unwrap();
    assert!(state.rejected);
    assert!(!state.acked);
}
