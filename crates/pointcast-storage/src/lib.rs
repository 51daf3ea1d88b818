//! Versioned pointer lists plus the pending-notification set.
//!
//! Every key owns an append-only list of payloads with the newest value at
//! the head; reads only ever see the head. Each successful store also places
//! a unique token into a single global pending set, which is how the outbox
//! layer tracks announcements that have not been acknowledged yet.
//!
//! # Core Invariants
//!
//! 1. **Head-Is-Latest**: the head of a key's list is its latest stored value
//! 2. **Store-Enqueues**: a store and its pending-set entry are issued as one
//!    pipelined unit
//! 3. **Ack-Removes**: a pending entry leaves the set only through
//!    [`Storage::remove_pending`], never through sampling

pub mod error;
pub mod memory;
pub mod redis;

pub use self::error::{StorageError, StorageResult};
pub use self::memory::MemoryStorage;
pub use self::redis::RedisStorage;

use async_trait::async_trait;
use rand::RngCore;
use std::fmt;
use std::sync::Arc;

/// Namespace prefix for version-list keys inside the storage engine.
pub const VSN_PREFIX: &[u8] = b"vsn:";

/// Key of the global set holding all pending notification tokens.
pub const PENDING_SET_KEY: &str = "vsn_notify";

/// Advisory maximum key length. URLs are generally under 2048 bytes; 4096
/// leaves room for maxed-out ones. Longer keys are logged, not rejected.
pub const KEY_MAX_LEN: usize = 4096;

/// A pending notification token: `key + NUL + 4 random bytes`.
///
/// The nonce keeps tokens for repeated writes to the same key distinct, so
/// several in-flight notifications can be acknowledged independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(Vec<u8>);

impl Token {
    /// Mint a fresh token for `key`.
    pub fn for_key(key: &[u8]) -> Self {
        let mut nonce = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut nonce);
        let mut buf = Vec::with_capacity(key.len() + 1 + nonce.len());
        buf.extend_from_slice(key);
        buf.push(0);
        buf.extend_from_slice(&nonce);
        Token(buf)
    }

    /// Wrap raw token bytes received from the wire.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Token(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Display for Token {
    /// Quoted, ASCII-escaped form for replies and logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.escape_ascii())
    }
}

/// Storage engine contract shared by all backends.
///
/// Implementations must provide atomic set add/remove and uniform random
/// sampling; the pending set is shared by concurrent writers, acknowledgers
/// and the reconciler without any further locking.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Latest payload stored under `key`, or empty if never written.
    async fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>>;

    /// Prepend `payload` to the key's version list and enqueue a fresh
    /// pending token, as one pipelined unit. Returns the token.
    async fn store(&self, key: &[u8], payload: &[u8]) -> StorageResult<Token>;

    /// Local names (the part after `prefix`) of every stored key starting
    /// with `prefix`. Empty, not an error, when nothing matches.
    async fn list(&self, prefix: &[u8]) -> StorageResult<Vec<String>>;

    /// Remove exactly one matching pending token.
    /// Fails with [`StorageError::NotFound`] if no such entry exists.
    async fn remove_pending(&self, token: &[u8]) -> StorageResult<()>;

    /// Up to `n` pending tokens, uniformly sampled without removal.
    async fn sample_pending(&self, n: usize) -> StorageResult<Vec<Token>>;
}

/// Internal storage key for a pointer's version list.
pub(crate) fn vsn_key(key: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(VSN_PREFIX.len() + key.len());
    buf.extend_from_slice(VSN_PREFIX);
    buf.extend_from_slice(key);
    buf
}

/// Open the backend selected by `driver`.
///
/// `redis` connects to `redis_url`; `memory` is an in-process engine for
/// tests and local development. Unknown drivers are a startup-fatal error.
pub async fn connect(driver: &str, redis_url: &str) -> StorageResult<Arc<dyn Storage>> {
    match driver {
        "redis" => Ok(Arc::new(RedisStorage::connect(redis_url).await?)),
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        other => Err(StorageError::UnsupportedBackend(other.to_string())),
    }
}
