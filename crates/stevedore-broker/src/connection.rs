//! The connection supervisor: wraps a [`Driver`] and makes sure it's
//! connected before every operation, reconnecting on demand rather than
//! eagerly. Grounded on `empath-common/src/controller.rs`'s "ping the
//! resource, establish it lazily if absent" shape.

use std::sync::Arc;

use crate::{
    driver::{Driver, MessageReceiver},
    error::BrokerError,
    topology::{Binding, Exchange, Publishing, Queue},
};

pub struct Connection {
    driver: Arc<dyn Driver>,
}

impl Connection {
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    #[must_use]
    pub fn driver(&self) -> Arc<dyn Driver> {
        Arc::clone(&self.driver)
    }

    async fn ping(&self) -> Result<(), BrokerError> {
        if self.driver.is_connected().await {
            return Ok(());
        }
        self.driver.connect().await
    }

    pub async fn declare_exchange(&self, exchange: &Exchange) -> Result<(), BrokerError> {
        self.ping().await?;
        self.driver.declare_exchange(exchange).await
    }

    pub async fn declare_queue(&self, queue: &Queue) -> Result<(), BrokerError> {
        self.ping().await?;
        self.driver.declare_queue(queue).await
    }

    pub async fn bind(&self, binding: &Binding) -> Result<(), BrokerError> {
        self.ping().await?;
        self.driver.bind(binding).await
    }

    pub async fn publish(&self, publishing: &Publishing) -> Result<(), BrokerError> {
        self.ping().await?;
        self.driver.publish(publishing).await
    }

    pub async fn consume(&self, queue: &Queue, prefetch: u16) -> Result<MessageReceiver, BrokerError> {
        self.ping().await?;
        self.driver.get_messages(queue, prefetch).await
    }
}
