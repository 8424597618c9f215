//! The handler contract user task functions implement.

use async_trait::async_trait;
use stevedore_proto::{CeleryValue, TaskEnvelope};
use thiserror::Error;

/// The sentinel a handler returns to ask for a requeue-after-delay rather
/// than a hard failure. Mirrors `original_source/task.go`'s `RetryError`.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("task asked to be retried")]
    Retry,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// A registered task implementation. `Ok(None)` acks the delivery with no
/// reply (spec.md §4.5-e: "handlers returning null succeed silently").
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, task: &TaskEnvelope) -> Result<Option<CeleryValue>, HandlerError>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(TaskEnvelope) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Option<CeleryValue>, HandlerError>> + Send,
{
    async fn call(&self, task: &TaskEnvelope) -> Result<Option<CeleryValue>, HandlerError> {
        (self)(task.clone()).await
    }
}
