//! The consume-and-dispatch pipeline: handler registry, decode, bounded
//! concurrency dispatch, and graceful shutdown.

pub mod consumer;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod registry;
pub mod shutdown;

pub use consumer::{prefetch_from_concurrency, Consumer, DecodedTask};
pub use error::WorkerError;
pub use handler::{Handler, HandlerError};
