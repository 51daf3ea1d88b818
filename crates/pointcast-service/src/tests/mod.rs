//! Integration tests for the pointcast service.
//!
//! - `harness.rs`   - Recording publisher and misbehaving storage doubles
//! - `store_get.rs` - Store/get handler behavior and end-to-end scenarios
//! - `list.rs`      - List and health reply shapes
//! - `outbox.rs`    - Announce, acknowledge and at-least-once behavior
//! - `reconcile.rs` - Reconciliation rounds and cooperative shutdown


mod outbox;
mod store_get;
