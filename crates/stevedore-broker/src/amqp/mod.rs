//! The bundled `amqp` transport.

mod driver;
mod writer;

pub use driver::{AmqpDriver, AmqpTransport};
