//! Announce, acknowledge and at-least-once behavior.

use crate::config::UPDATES_SUBJECT;
use crate::outbox::Outbox;
use crate::tests::harness::{setup, FailingPublisher};
use pointcast_storage::{MemoryStorage, Storage};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_store_announces_token() {
    let ctx = setup();

    let token = ctx.outbox.store_and_announce(b"k", b"v").await.unwrap();

    let announced = ctx.publisher.payloads_on(UPDATES_SUBJECT);
    assert_eq!(announced, vec![token.as_bytes().to_vec()]);
}

#[tokio::test]
async fn test_announce_failure_keeps_write_and_pending() {
    // Transport down: the store still succeeds and the pending entry
    // survives for the reconciler.
    let storage = Arc::new(MemoryStorage::new());
    let outbox = Outbox::new(
        storage.clone(),
        Arc::new(FailingPublisher),
        Duration::from_secs(1),
    );

    let token = outbox.store_and_announce(b"k", b"v").await.unwrap();

    assert_eq!(storage.get(b"k").await.unwrap(), b"v");
    assert!(storage.is_pending(token.as_bytes()));
}

#[tokio::test]
async fn test_accept_removes_pending_entry() {
    let ctx = setup();
    let token = ctx.outbox.store_and_announce(b"k", b"v").await.unwrap();

    ctx.outbox.accept(token.as_bytes()).await;
    assert_eq!(ctx.storage.pending_len(), 0);
}

#[tokio::test]
async fn test_duplicate_accept_is_harmless() {
    let ctx = setup();
    let t1 = ctx.outbox.store_and_announce(b"k", b"v1").await.unwrap();
    let t2 = ctx.outbox.store_and_announce(b"k", b"v2").await.unwrap();

    ctx.outbox.accept(t1.as_bytes()).await;
    ctx.outbox.accept(t1.as_bytes()).await;
    ctx.outbox.accept(t1.as_bytes()).await;

    // The other entry is untouched.
    assert!(ctx.storage.is_pending(t2.as_bytes()));
    assert_eq!(ctx.storage.pending_len(), 1);
}

#[tokio::test]
async fn test_accept_never_pending_token_is_harmless() {
    let ctx = setup();
    ctx.outbox.store_and_announce(b"k", b"v").await.unwrap();

    ctx.outbox.accept(b"was\x00never-pending").await;
    assert_eq!(ctx.storage.pending_len(), 1);
}

#[tokio::test]
async fn test_resend_reports_sent_count() {
    let ctx = setup();
    for i in 0..4 {
        let key = format!("k{}", i);
        ctx.outbox
            .store_and_announce(key.as_bytes(), b"v")
            .await
            .unwrap();
    }
    ctx.publisher.clear();

    let sent = ctx.outbox.resend_pending(35).await.unwrap();
    assert_eq!(sent, 4);
    assert_eq!(ctx.publisher.payloads_on(UPDATES_SUBJECT).len(), 4);
}
