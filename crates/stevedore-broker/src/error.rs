//! Broker-level error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("amqp: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("no broker uri configured")]
    NoUris,

    #[error("unknown transport scheme: {0}")]
    UnknownTransport(String),

    #[error("not connected")]
    NotConnected,

    #[error("exhausted {0} connect attempts")]
    MaxRetriesExceeded(u64),

    #[error("writer task is gone")]
    WriterGone,
}
