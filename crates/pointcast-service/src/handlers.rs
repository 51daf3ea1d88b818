//! Request handlers for the NATS request-reply surface.
//!
//! Each handler is stateless beyond the shared outbox handle and always
//! produces a reply (except `accepted`, which is fire-and-forget). Internal
//! failures never cross the handler boundary: the caller sees `ERR` or a
//! `success: false` body and the detail goes to the log.

use crate::config::{
    ACCEPTED_SUBJECT, GET_SUBJECT, HEALTH_SUBJECT, LIST_SUBJECT, STORE_SUBJECT,
};
use crate::error::ServiceResult;
use crate::outbox::Outbox;
use crate::ServiceError;
use futures_util::StreamExt;
use pointcast_storage::KEY_MAX_LEN;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Generic failure reply.
const ERR_REPLY: &[u8] = b"ERR";

/// Structured reply for list requests.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<String>>,
}

/// Request handlers over the shared outbox.
pub struct Handlers {
    outbox: Arc<Outbox>,
}

impl Handlers {
    pub fn new(outbox: Arc<Outbox>) -> Self {
        Self { outbox }
    }

    /// Reply for a get request: the latest payload, empty if never written,
    /// `ERR` only on a storage failure.
    pub async fn get_reply(&self, key: &[u8]) -> Vec<u8> {
        if key.len() > KEY_MAX_LEN {
            warn!(key_len = key.len(), "Provided key exceeds advisory maximum");
        }
        match self.outbox.bounded(self.outbox.storage().get(key)).await {
            Ok(payload) => payload,
            Err(e) => {
                error!(key = %String::from_utf8_lossy(key), error = %e, "Error fetching pointer");
                ERR_REPLY.to_vec()
            }
        }
    }

    /// Reply for a store request (`key \n payload`): `OK "<token>"`, or
    /// `ERR` for malformed input or a storage failure.
    pub async fn store_reply(&self, body: &[u8]) -> Vec<u8> {
        let sep = match body.iter().position(|&b| b == b'\n') {
            Some(pos) => pos,
            None => {
                warn!("Incorrectly formatted store request ignored");
                return ERR_REPLY.to_vec();
            }
        };
        let (key, payload) = (&body[..sep], &body[sep + 1..]);

        if key.len() > KEY_MAX_LEN {
            warn!(key_len = key.len(), "Provided key exceeds advisory maximum");
        }

        match self.outbox.store_and_announce(key, payload).await {
            Ok(token) => format!("OK {}", token).into_bytes(),
            Err(e) => {
                error!(key = %String::from_utf8_lossy(key), error = %e, "Error storing pointer");
                ERR_REPLY.to_vec()
            }
        }
    }

    /// Reply for a list request: JSON with the local names under `prefix`.
    pub async fn list_reply(&self, prefix: &[u8]) -> Vec<u8> {
        let response = match self.outbox.bounded(self.outbox.storage().list(prefix)).await {
            Ok(contents) => ListResponse {
                success: true,
                status: None,
                contents: Some(contents),
            },
            Err(e) => {
                error!(
                    prefix = %String::from_utf8_lossy(prefix),
                    error = %e,
                    "Error listing pointers"
                );
                ListResponse {
                    success: false,
                    status: Some("INTERNAL_ERROR".to_string()),
                    contents: None,
                }
            }
        };

        match serde_json::to_vec(&response) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Unable to encode list response");
                ERR_REPLY.to_vec()
            }
        }
    }

    /// Handle an acknowledgment. Fire-and-forget: no reply, errors logged
    /// inside the outbox.
    pub async fn accepted(&self, token: &[u8]) {
        self.outbox.accept(token).await;
    }

    /// Reply for a health probe.
    pub fn health_reply(&self) -> Vec<u8> {
        b"{\"health\":true}".to_vec()
    }
}

/// Subscribe to every request subject and dispatch messages to the handlers.
///
/// One task per subscription; each message is handled on its own task so
/// slow storage calls on one subject never block the others.
pub async fn serve(client: async_nats::Client, handlers: Arc<Handlers>) -> ServiceResult<()> {
    subscribe(&client, GET_SUBJECT, handlers.clone(), |h, body| async move {
        Some(h.get_reply(&body).await)
    })
    .await?;

    subscribe(&client, STORE_SUBJECT, handlers.clone(), |h, body| async move {
        Some(h.store_reply(&body).await)
    })
    .await?;

    subscribe(&client, LIST_SUBJECT, handlers.clone(), |h, body| async move {
        Some(h.list_reply(&body).await)
    })
    .await?;

    subscribe(&client, ACCEPTED_SUBJECT, handlers.clone(), |h, body| async move {
        h.accepted(&body).await;
        None
    })
    .await?;

    subscribe(&client, HEALTH_SUBJECT, handlers, |h, _body| async move {
        Some(h.health_reply())
    })
    .await?;

    info!("Subscriptions established");
    Ok(())
}

async fn subscribe<F, Fut>(
    client: &async_nats::Client,
    subject: &'static str,
    handlers: Arc<Handlers>,
    handle: F,
) -> ServiceResult<()>
where
    F: Fn(Arc<Handlers>, Vec<u8>) -> Fut + Send + Sync + Copy + 'static,
    Fut: std::future::Future<Output = Option<Vec<u8>>> + Send,
{
    let mut subscription = client
        .subscribe(subject)
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;
    let client = client.clone();

    tokio::spawn(async move {
        while let Some(message) = subscription.next().await {
            let handlers = handlers.clone();
            let client = client.clone();
            tokio::spawn(async move {
                let reply = handle(handlers, message.payload.to_vec()).await;
                if let (Some(reply), Some(reply_subject)) = (reply, message.reply) {
                    if let Err(e) = client.publish(reply_subject, reply.into()).await {
                        warn!(subject, error = %e, "Unable to respond");
                    }
                }
            });
        }
        info!(subject, "Subscription closed");
    });

    Ok(())
}
