use stevedore_broker::topology::{binding, durable_exchange, durable_queue, expiring_reply_queue};

#[test]
fn binding_carries_routing_key_and_both_endpoints() {
    let exchange = durable_exchange("celery");
    let queue = durable_queue("celery");
    let b = binding(exchange.clone(), queue.clone(), "celery");

    assert_eq!(b.routing_key, "celery");
    assert_eq!(b.exchange, exchange);
    assert_eq!(b.queue, queue);
}

#[test]
fn reply_queue_name_matches_task_id_shape() {
    let queue = expiring_reply_queue("d3858e6848da4631b42b7dbd0ffa08d1");
    assert_eq!(queue.name.len(), 32);
    assert!(queue.auto_delete);
    assert!(!queue.durable);
}
