//! Reconciliation loop: eventual delivery for unacknowledged announcements.
//!
//! A single background task samples a bounded batch from the pending set on
//! a fixed interval and re-announces every token it drew. Sampling is
//! uniform and non-destructive: a token only ever leaves the set through an
//! acknowledgment. No per-entry backoff or retry counter by design; a
//! persistently undelivered token is simply resampled on a later round.

use crate::outbox::Outbox;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Periodic re-announcer for pending notifications.
pub struct Reconciler {
    outbox: Arc<Outbox>,
    interval: Duration,
    batch: usize,
}

impl Reconciler {
    pub fn new(outbox: Arc<Outbox>, interval: Duration, batch: usize) -> Self {
        Self {
            outbox,
            interval,
            batch,
        }
    }

    /// Run rounds until `shutdown` flips.
    ///
    /// The stop signal is only observed between rounds; an in-flight round
    /// finishes before the task exits. The first round runs immediately so
    /// entries left over from a previous process get re-announced right away.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            batch = self.batch,
            "Starting reconciliation loop"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Reconciliation loop stopping");
                    return;
                }
                _ = ticker.tick() => {
                    self.round().await;
                }
            }
        }
    }

    /// One round: sample, re-announce, log. A failed round is dropped and
    /// retried on the next interval; it never ends the loop.
    pub async fn round(&self) {
        match self.outbox.resend_pending(self.batch).await {
            Ok(0) => {}
            Ok(sent) => {
                info!(count = sent, "Sent notifications");
            }
            Err(e) => {
                warn!(error = %e, "Error while fetching pending notifications");
            }
        }
    }
}
