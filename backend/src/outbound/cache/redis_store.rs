//! Redis-backed `CacheStore` pooled through `bb8-redis`.
//!
//! Values are stored as raw bytes with `SET key value EX ttl`. Prefix
//! enumeration walks the keyspace with cursor-based `SCAN MATCH`, never
//! `KEYS`.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::redis::{self, AsyncCommands};
use tracing::debug;

use crate::domain::ports::{CacheKey, CacheStore, CacheStoreError};

const SCAN_BATCH: usize = 200;

/// Shared Redis cache.
#[derive(Clone)]
pub struct RedisCacheStore {
    pool: Pool<RedisConnectionManager>,
}

impl RedisCacheStore {
    /// Connect a pool to `redis_url` with the given checkout timeout.
    ///
    /// # Errors
    ///
    /// Returns `CacheStoreError::Backend` when the URL is invalid or the
    /// first connection cannot be established.
    pub async fn connect(redis_url: &str, timeout: Duration) -> Result<Self, CacheStoreError> {
        let manager = RedisConnectionManager::new(redis_url).map_err(map_redis_error)?;
        let pool = Pool::builder()
            .connection_timeout(timeout)
            .build(manager)
            .await
            .map_err(map_redis_error)?;
        Ok(Self { pool })
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, CacheStoreError> {
        self.pool
            .get()
            .await
            .map_err(|err| CacheStoreError::backend(format!("redis checkout: {err}")))
    }
}

fn map_redis_error(error: redis::RedisError) -> CacheStoreError {
    CacheStoreError::backend(error.to_string())
}

/// Glob pattern matching every key that starts with `prefix`.
fn match_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('*');
    pattern
}

/// Redis `EX` requires a positive whole number of seconds.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheStoreError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<Vec<u8>>>(key.as_str())
            .await
            .map_err(map_redis_error)
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key.as_str(), value, ttl_seconds(ttl))
            .await
            .map_err(map_redis_error)
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheStoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key.as_str())
            .await
            .map_err(map_redis_error)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<CacheKey>, CacheStoreError> {
        let pattern = match_pattern(prefix);
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut found = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await
                .map_err(map_redis_error)?;
            for raw in batch {
                match CacheKey::new(raw) {
                    Ok(key) => found.push(key),
                    Err(err) => debug!(error = %err, "skipping unusable key from scan"),
                }
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("users:list:", "users:list:*")]
    #[case("odd*[prefix]?", "odd\\*\\[prefix\\]\\?*")]
    fn prefixes_become_escaped_globs(#[case] prefix: &str, #[case] expected: &str) {
        assert_eq!(match_pattern(prefix), expected);
    }

    #[rstest]
    #[case(Duration::from_secs(300), 300)]
    #[case(Duration::from_millis(10), 1)]
    fn ttl_is_whole_seconds_and_positive(#[case] ttl: Duration, #[case] expected: u64) {
        assert_eq!(ttl_seconds(ttl), expected);
    }
}
