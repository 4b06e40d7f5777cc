use chat_core::Message;
use futures_util::future::join_all;
use service_hub::registry::{
    ClientHandle, DeliveryOutcome, OUTBOUND_BUFFER_SIZE, RegisterOutcome, Registry,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

fn handle() -> (ClientHandle, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
    (ClientHandle::new(Uuid::now_v7(), tx), rx)
}

#[tokio::test]
async fn test_duplicate_identity_rejected() {
    let registry = Registry::new();
    let (first, _rx1) = handle();
    let (second, _rx2) = handle();

    assert_eq!(registry.register("alice", first), RegisterOutcome::Registered);
    assert_eq!(registry.register("alice", second), RegisterOutcome::IdentityTaken);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_one_winner_under_contention() {
    let registry = Arc::new(Registry::new());

    let attempts = (0..16).map(|_| {
        let registry = registry.clone();
        let (candidate, rx) = handle();
        tokio::spawn(async move {
            let outcome = registry.register("popular", candidate);
            // Keep the receiver alive until the claim is decided.
            drop(rx);
            outcome
        })
    });

    let outcomes = join_all(attempts).await;
    let winners = outcomes
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .filter(|outcome| *outcome == RegisterOutcome::Registered)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_deregister_requires_owning_connection() {
    let registry = Registry::new();
    let conn = Uuid::now_v7();
    let (tx, _rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);

    registry.register("alice", ClientHandle::new(conn, tx));

    assert!(!registry.deregister("alice", Uuid::now_v7()));
    assert!(registry.contains("alice"));

    assert!(registry.deregister("alice", conn));
    assert!(!registry.contains("alice"));
}

#[tokio::test]
async fn test_deliver_to_registered_client() {
    let registry = Registry::new();
    let (client, mut rx) = handle();
    registry.register("bob", client);

    let message = Message::chat("alice", "bob", "hi");
    let outcome = registry.deliver("bob", message.clone()).await;

    assert_eq!(outcome, DeliveryOutcome::Delivered);
    assert_eq!(rx.recv().await, Some(message));
}

#[tokio::test]
async fn test_deliver_to_offline_identity() {
    let registry = Registry::new();
    let outcome = registry.deliver("nobody", Message::chat("a", "nobody", "x")).await;
    assert_eq!(outcome, DeliveryOutcome::Offline);
}

#[tokio::test]
async fn test_dead_connection_evicted_on_delivery() {
    let registry = Registry::new();
    let (client, rx) = handle();
    registry.register("bob", client);
    drop(rx);

    let outcome = registry.deliver("bob", Message::chat("a", "bob", "x")).await;
    assert_eq!(outcome, DeliveryOutcome::ConnectionGone);
    assert!(!registry.contains("bob"));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_replay_delivery_pinned_to_connection() {
    let registry = Registry::new();
    let conn = Uuid::now_v7();
    let (tx, mut rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
    registry.register("bob", ClientHandle::new(conn, tx));

    let message = Message::chat("a", "bob", "old mail");
    let stale = registry.deliver_to("bob", Uuid::now_v7(), message.clone()).await;
    assert_eq!(stale, DeliveryOutcome::Offline);

    let current = registry.deliver_to("bob", conn, message.clone()).await;
    assert_eq!(current, DeliveryOutcome::Delivered);
    assert_eq!(rx.recv().await, Some(message));
}
