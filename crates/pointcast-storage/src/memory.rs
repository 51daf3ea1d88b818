//! In-process storage backend.
//!
//! Same contract as the Redis engine over plain collections behind a mutex.
//! Selectable as the `memory` driver; this is also what the contract and
//! handler tests run against.

use crate::error::{StorageError, StorageResult};
use crate::{Storage, Token};
use async_trait::async_trait;
use rand::seq::IteratorRandom;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    /// Version lists, newest payload first.
    lists: HashMap<Vec<u8>, Vec<Vec<u8>>>,
    /// Global pending-notification set.
    pending: HashSet<Vec<u8>>,
}

/// In-memory storage engine.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending tokens. Test observability only.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether a token is still pending. Test observability only.
    pub fn is_pending(&self, token: &[u8]) -> bool {
        self.lock().pending.contains(token)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // No operation holds the lock across a panic point that could leave
        // the maps inconsistent, so a poisoned lock is still usable.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>> {
        let inner = self.lock();
        Ok(inner
            .lists
            .get(key)
            .and_then(|versions| versions.first())
            .cloned()
            .unwrap_or_default())
    }

    async fn store(&self, key: &[u8], payload: &[u8]) -> StorageResult<Token> {
        let token = Token::for_key(key);
        let mut inner = self.lock();
        inner
            .lists
            .entry(key.to_vec())
            .or_default()
            .insert(0, payload.to_vec());
        inner.pending.insert(token.as_bytes().to_vec());
        Ok(token)
    }

    async fn list(&self, prefix: &[u8]) -> StorageResult<Vec<String>> {
        let inner = self.lock();
        Ok(inner
            .lists
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(|key| String::from_utf8_lossy(&key[prefix.len()..]).into_owned())
            .collect())
    }

    async fn remove_pending(&self, token: &[u8]) -> StorageResult<()> {
        let mut inner = self.lock();
        if !inner.pending.remove(token) {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn sample_pending(&self, n: usize) -> StorageResult<Vec<Token>> {
        let inner = self.lock();
        Ok(inner
            .pending
            .iter()
            .choose_multiple(&mut rand::thread_rng(), n)
            .into_iter()
            .map(|bytes| Token::from_bytes(bytes.clone()))
            .collect())
    }
}
