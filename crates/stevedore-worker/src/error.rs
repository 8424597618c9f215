//! Worker-level error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error(transparent)]
    Broker(#[from] stevedore_broker::BrokerError),
}
