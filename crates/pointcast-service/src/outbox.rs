//! Outbox protocol: store-then-announce, acknowledge-and-remove, resend.
//!
//! The reliability core. A write persists its payload and a pending token as
//! one storage unit, then announces the token. Announcements are
//! fire-and-forget; the pending entry is what guarantees redelivery. Only an
//! acknowledgment removes an entry.

use crate::config::UPDATES_SUBJECT;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use pointcast_storage::{Storage, StorageError, Token};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Outbound fire-and-forget channel for change announcements.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> ServiceResult<()>;
}

/// Publisher backed by a NATS client.
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for NatsPublisher {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> ServiceResult<()> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))
    }
}

/// The outbox: shared storage handle plus the announcement channel.
pub struct Outbox {
    storage: Arc<dyn Storage>,
    publisher: Arc<dyn Publisher>,
    storage_deadline: Duration,
}

impl Outbox {
    pub fn new(
        storage: Arc<dyn Storage>,
        publisher: Arc<dyn Publisher>,
        storage_deadline: Duration,
    ) -> Self {
        Self {
            storage,
            publisher,
            storage_deadline,
        }
    }

    /// Persist `payload` under `key` and announce the new pending token.
    ///
    /// A publish failure is logged and swallowed: the write and its pending
    /// entry are already durable, so the reconciler will re-announce it.
    pub async fn store_and_announce(&self, key: &[u8], payload: &[u8]) -> ServiceResult<Token> {
        let token = self.bounded(self.storage.store(key, payload)).await?;

        if let Err(e) = self
            .publisher
            .publish(UPDATES_SUBJECT, token.as_bytes().to_vec())
            .await
        {
            warn!(token = %token, error = %e, "Announce failed, reconciler will retry");
        }

        Ok(token)
    }

    /// Remove the pending entry for an acknowledged token.
    ///
    /// Never propagates: a missing entry is the expected duplicate-ack case
    /// under at-least-once delivery, anything else is logged.
    pub async fn accept(&self, token: &[u8]) {
        match self.bounded(self.storage.remove_pending(token)).await {
            Ok(()) => {
                debug!(token = %Token::from_bytes(token.to_vec()), "Pending entry removed");
            }
            Err(ServiceError::Storage(StorageError::NotFound)) => {
                debug!(
                    token = %Token::from_bytes(token.to_vec()),
                    "Acknowledgment for unknown token, already removed?"
                );
            }
            Err(e) => {
                error!(
                    token = %Token::from_bytes(token.to_vec()),
                    error = %e,
                    "Error removing pending entry"
                );
            }
        }
    }

    /// Sample up to `batch` pending tokens and re-announce each one.
    ///
    /// Returns how many were sent. Per-token publish failures are logged and
    /// skipped; the entry stays pending and will be resampled later.
    pub async fn resend_pending(&self, batch: usize) -> ServiceResult<usize> {
        let tokens = self.bounded(self.storage.sample_pending(batch)).await?;

        let mut sent = 0;
        for token in &tokens {
            match self
                .publisher
                .publish(UPDATES_SUBJECT, token.as_bytes().to_vec())
                .await
            {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!(token = %token, error = %e, "Error re-announcing pending token");
                }
            }
        }
        Ok(sent)
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Cap a storage call at the configured deadline.
    pub(crate) async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, StorageError>>,
    ) -> ServiceResult<T> {
        match tokio::time::timeout(self.storage_deadline, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ServiceError::DeadlineExceeded(
                self.storage_deadline.as_millis() as u64,
            )),
        }
    }
}
