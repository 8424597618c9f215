//! Transport-abstracted broker access: topology value types, the
//! [`driver::Driver`] trait, the bundled AMQP driver, the transport
//! registry, a connection supervisor, and connect-with-backoff.

pub mod amqp;
pub mod backoff;
pub mod connection;
pub mod driver;
pub mod error;
pub mod topology;
pub mod transport;

pub use connection::Connection;
pub use driver::{Driver, Message, MessageReceiver, Receipt, ReceiptOps};
pub use error::BrokerError;
