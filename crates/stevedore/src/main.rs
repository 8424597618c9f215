//! The `stevedore` worker binary: wires configuration, the broker
//! connection, the handler registry, and the consume-and-dispatch pipeline
//! together. Grounded on `empath/src/main.rs`'s "build the pieces, race the
//! server against shutdown" shape, adapted to this worker's own
//! (non-raced, drain-based) shutdown model described in spec.md §4.5.

mod cli;
mod demo;

use std::sync::Arc;

use clap::Parser;
use stevedore_broker::{
    topology::{binding, durable_exchange, durable_queue},
    transport, Connection,
};
use stevedore_common::{config::WorkerConfig, internal, logging};
use stevedore_worker::{consumer::Consumer, dispatch, prefetch_from_concurrency, registry, shutdown};
use tokio::sync::mpsc;

const DELIVERIES_BUFFER: usize = 16;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init(cli.log_level);

    let config = WorkerConfig::new(&cli.broker, cli.queue.clone(), cli.concurrency, cli.log_level)
        .unwrap_or_else(|err| {
            internal!(level = ERROR, error = %err, "invalid configuration");
            panic!("unrecoverable start-up error: {err}");
        });

    let prefetch = prefetch_from_concurrency(config.concurrency).unwrap_or_else(|err| {
        internal!(level = ERROR, error = %err, "invalid configuration");
        panic!("unrecoverable start-up error: {err}");
    });

    transport::register_builtins();
    registry::register("myapp.add", Arc::new(demo::Adder));

    let driver = transport::open(&config.scheme, config.broker_uris.clone()).unwrap_or_else(|err| {
        internal!(level = ERROR, error = %err, "unknown transport");
        panic!("unknown transport scheme {:?}", config.scheme);
    });
    let connection = Arc::new(Connection::new(driver));

    let exchange = durable_exchange("celery");
    let queue = durable_queue(config.queue.clone());
    connection.declare_exchange(&exchange).await?;
    connection.declare_queue(&queue).await?;
    connection
        .bind(&binding(exchange, queue.clone(), "celery"))
        .await?;

    let (deliveries_tx, deliveries_rx) = mpsc::channel(DELIVERIES_BUFFER);
    let consumer = Consumer::new(connection, queue, prefetch);

    tokio::spawn(shutdown::watch_for_interrupt());
    tokio::spawn(async move { consumer.run(deliveries_tx).await });

    internal!(level = INFO, queue = %cli.queue, concurrency = config.concurrency, "stevedore worker started");
    dispatch::run(deliveries_rx, shutdown::SHUTDOWN_BROADCAST.subscribe()).await;

    internal!(level = INFO, "all outstanding work drained, exiting");
    Ok(())
}
