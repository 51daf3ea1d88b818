//! Configuration for the pointcast service.

use std::time::Duration;

/// Subject prefix for the request-reply surface.
pub const BASE: &str = "pointcast.";

/// Get request subject: raw key in, raw payload out.
pub const GET_SUBJECT: &str = "pointcast.get";
/// Store request subject: `key \n payload` in, `OK "<token>"` out.
pub const STORE_SUBJECT: &str = "pointcast.store";
/// List request subject: raw prefix in, JSON out.
pub const LIST_SUBJECT: &str = "pointcast.list";
/// Health probe subject.
pub const HEALTH_SUBJECT: &str = "pointcast.health";

/// Fire-and-forget subject carrying raw token bytes for every new or
/// re-announced pending entry.
pub const UPDATES_SUBJECT: &str = "pointer-updates-v1";
/// Acknowledgment subject: subscribers send the token back here once a
/// change has been processed.
pub const ACCEPTED_SUBJECT: &str = "pointer-updates-v1.accepted";

/// Service configuration, populated once at startup and validated eagerly.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Storage driver name (`redis` or `memory`)
    pub storage_driver: String,

    /// Redis connection URL
    pub redis_url: String,

    /// NATS connection URL
    pub nats_url: String,

    /// Per-call deadline for storage operations
    pub storage_deadline: Duration,

    /// Interval between reconcile rounds
    pub reconcile_interval: Duration,

    /// Maximum pending tokens re-announced per round
    pub reconcile_batch: usize,
}

impl ServiceConfig {
    /// Default per-call storage deadline in milliseconds.
    pub const DEFAULT_STORAGE_DEADLINE_MS: u64 = 1000;
    /// Default reconcile interval in seconds.
    pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 5;
    /// Default reconcile batch size.
    pub const DEFAULT_RECONCILE_BATCH: usize = 35;
}
