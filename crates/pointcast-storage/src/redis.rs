//! Redis storage backend.
//!
//! Version lists are Redis lists under `vsn:<key>` (LPUSH/LRANGE), the
//! pending set is one global set (SADD/SREM/SRANDMEMBER). Prefix listing
//! walks the keyspace with SCAN, never KEYS.

use crate::error::{StorageError, StorageResult};
use crate::{vsn_key, Storage, Token, PENDING_SET_KEY};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::debug;

/// Redis storage engine.
pub struct RedisStorage {
    conn: MultiplexedConnection,
}

impl RedisStorage {
    /// Connect to Redis at `url`.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let client = Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn get(&self, key: &[u8]) -> StorageResult<Vec<u8>> {
        let mut conn = self.conn.clone();
        let data: Vec<Vec<u8>> = conn.lrange(vsn_key(key), 0, 0).await?;
        Ok(data.into_iter().next().unwrap_or_default())
    }

    async fn store(&self, key: &[u8], payload: &[u8]) -> StorageResult<Token> {
        let mut conn = self.conn.clone();
        let token = Token::for_key(key);

        // One MULTI/EXEC pipeline: the write and its pending entry land
        // together or the whole store is reported failed.
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.lpush(vsn_key(key), payload).ignore();
        pipe.sadd(PENDING_SET_KEY, token.as_bytes()).ignore();
        let _: () = pipe.query_async(&mut conn).await?;

        Ok(token)
    }

    async fn list(&self, prefix: &[u8]) -> StorageResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let full_prefix = vsn_key(prefix);
        let mut pattern = escape_match(&full_prefix);
        pattern.push(b'*');

        let mut suffixes = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<Vec<u8>>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            for key in keys {
                suffixes.push(String::from_utf8_lossy(&key[full_prefix.len()..]).into_owned());
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(prefix_len = prefix.len(), matched = suffixes.len(), "Listed keys");
        Ok(suffixes)
    }

    async fn remove_pending(&self, token: &[u8]) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.srem(PENDING_SET_KEY, token).await?;
        if removed < 1 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn sample_pending(&self, n: usize) -> StorageResult<Vec<Token>> {
        let mut conn = self.conn.clone();
        let members: Vec<Vec<u8>> = conn.srandmember_multiple(PENDING_SET_KEY, n).await?;
        Ok(members.into_iter().map(Token::from_bytes).collect())
    }
}

/// Escape glob metacharacters so a caller prefix only ever matches literally.
fn escape_match(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    for &b in raw {
        if matches!(b, b'*' | b'?' | b'[' | b']' | b'\\') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out
}
