//! Store/get handler behavior and end-to-end scenarios.

use crate::config::UPDATES_SUBJECT;
use crate::tests::harness::{setup, setup_with_storage, FailingStorage, HangingStorage};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_get_unwritten_key_is_empty_not_error() {
    let ctx = setup();
    assert_eq!(ctx.handlers.get_reply(b"never-written").await, b"");
}

#[tokio::test]
async fn test_store_then_get() {
    let ctx = setup();

    let reply = ctx.handlers.store_reply(b"user:42\nptr-v1").await;
    assert!(reply.starts_with(b"OK \""), "reply was {:?}", reply);

    assert_eq!(ctx.handlers.get_reply(b"user:42").await, b"ptr-v1");
}

#[tokio::test]
async fn test_last_write_wins() {
    let ctx = setup();
    for i in 0..4 {
        let body = format!("k\nptr-v{}", i);
        ctx.handlers.store_reply(body.as_bytes()).await;
    }
    assert_eq!(ctx.handlers.get_reply(b"k").await, b"ptr-v3");
}

#[tokio::test]
async fn test_payload_may_contain_separator() {
    // Only the first newline splits key from payload.
    let ctx = setup();
    ctx.handlers.store_reply(b"k\nline1\nline2").await;
    assert_eq!(ctx.handlers.get_reply(b"k").await, b"line1\nline2");
}

#[tokio::test]
async fn test_malformed_store_request() {
    let ctx = setup();

    let reply = ctx.handlers.store_reply(b"nosep").await;
    assert_eq!(reply, b"ERR");

    // No partial write: nothing stored, nothing pending, nothing announced.
    assert_eq!(ctx.handlers.get_reply(b"nosep").await, b"");
    assert_eq!(ctx.storage.pending_len(), 0);
    assert_eq!(ctx.publisher.published_count(), 0);
}

#[tokio::test]
async fn test_get_engine_outage_is_err_reply() {
    let (_, handlers) =
        setup_with_storage(Arc::new(FailingStorage), Duration::from_secs(1));
    assert_eq!(handlers.get_reply(b"k").await, b"ERR");
}

#[tokio::test]
async fn test_store_engine_outage_is_err_reply() {
    let (_, handlers) =
        setup_with_storage(Arc::new(FailingStorage), Duration::from_secs(1));
    assert_eq!(handlers.store_reply(b"k\nv").await, b"ERR");
}

#[tokio::test]
async fn test_storage_deadline_is_a_failure() {
    let (_, handlers) =
        setup_with_storage(Arc::new(HangingStorage), Duration::from_millis(20));
    assert_eq!(handlers.get_reply(b"k").await, b"ERR");
    assert_eq!(handlers.store_reply(b"k\nv").await, b"ERR");
}

#[tokio::test]
async fn test_oversized_key_is_logged_not_rejected() {
    let ctx = setup();
    let long_key = vec![b'k'; 5000];

    let mut body = long_key.clone();
    body.push(b'\n');
    body.extend_from_slice(b"v");

    let reply = ctx.handlers.store_reply(&body).await;
    assert!(reply.starts_with(b"OK "));
    assert_eq!(ctx.handlers.get_reply(&long_key).await, b"v");
}

#[tokio::test]
async fn test_two_writes_ack_one_scenario() {
    let ctx = setup();

    // Store ptr-v1, then ptr-v2 under the same key.
    ctx.handlers.store_reply(b"user:42\nptr-v1").await;
    assert_eq!(ctx.handlers.get_reply(b"user:42").await, b"ptr-v1");

    ctx.handlers.store_reply(b"user:42\nptr-v2").await;
    assert_eq!(ctx.handlers.get_reply(b"user:42").await, b"ptr-v2");

    let announced = ctx.publisher.payloads_on(UPDATES_SUBJECT);
    assert_eq!(announced.len(), 2);
    let (t1, t2) = (announced[0].clone(), announced[1].clone());
    assert_ne!(t1, t2);

    // Acknowledge the first write; only the second stays pending.
    ctx.handlers.accepted(&t1).await;
    assert!(!ctx.storage.is_pending(&t1));
    assert!(ctx.storage.is_pending(&t2));

    // The next reconcile round re-announces T2, never T1.
    ctx.publisher.clear();
    ctx.outbox.resend_pending(35).await.unwrap();
    assert_eq!(ctx.publisher.payloads_on(UPDATES_SUBJECT), vec![t2]);
}
