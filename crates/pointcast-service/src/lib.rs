//! Pointcast: versioned pointer store with reliable change notification.
//!
//! Clients store an opaque payload under a key and read back the most recent
//! one, over NATS request-reply. Every successful store is announced to
//! subscribers at least once: the write and a durable pending entry land
//! together, and a background reconciler keeps re-announcing any entry that
//! was never acknowledged.
//!
//! # Core Invariants
//!
//! 1. **At-Least-Once**: a stored write's token is announced until an
//!    acknowledgment removes its pending entry; duplicates are expected
//! 2. **Ack-Gated Removal**: only an `accepted` message removes a pending
//!    entry; reconciliation re-emits and never removes
//! 3. **Bounded Calls**: every storage call made on behalf of a request or a
//!    reconcile round is capped by a short deadline
//!
//! # Architecture
//!
//! ```text
//! get/store/list ----> Handlers ----> Storage (lists + pending set)
//!                         |                      ^
//!                         v                      |
//!                  pointer-updates-v1     accepted (SREM)
//!                         ^
//!                         |
//!                    Reconciler (SRANDMEMBER, every 5s)
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod outbox;
pub mod reconcile;

#[cfg(test)]
mod tests;

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use handlers::Handlers;
pub use outbox::{NatsPublisher, Outbox, Publisher};
pub use reconcile::Reconciler;
