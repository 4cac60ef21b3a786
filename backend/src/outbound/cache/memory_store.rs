//! Process-local `CacheStore` with per-entry expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{CacheKey, CacheStore, CacheStoreError};

struct Entry {
    value: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// Map-backed cache; expired entries are never returned and are dropped on
/// the next access.
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl MemoryCacheStore {
    /// Build a cache judging expiry against `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.utc();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|entry| entry.expires_at > now).count())
            .unwrap_or_default()
    }

    /// Whether no live entries remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheStoreError> {
        self.entries
            .lock()
            .map_err(|_| CacheStoreError::backend("cache lock poisoned"))
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        match entries.get(key.as_str()) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), CacheStoreError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|err| CacheStoreError::backend(format!("ttl out of range: {err}")))?;
        let expires_at = self.clock.utc() + ttl;
        self.lock()?.insert(
            key.as_str().to_owned(),
            Entry {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheStoreError> {
        self.lock()?.remove(key.as_str());
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<CacheKey>, CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        entries.retain(|_, entry| entry.expires_at > now);
        entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(|key| CacheKey::new(key.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CacheStoreError::backend(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MutableClock, fixture_instant};
    use rstest::{fixture, rstest};

    struct Harness {
        clock: Arc<MutableClock>,
        cache: MemoryCacheStore,
    }

    #[fixture]
    fn harness() -> Harness {
        let clock = Arc::new(MutableClock::new(fixture_instant()));
        let cache = MemoryCacheStore::with_clock(clock.clone());
        Harness { clock, cache }
    }

    fn key(raw: &str) -> CacheKey {
        CacheKey::new(raw).expect("valid key")
    }

    #[rstest]
    #[tokio::test]
    async fn entries_expire_at_their_ttl(harness: Harness) {
        let k = key("users:get:1");
        harness
            .cache
            .set(&k, b"{}", Duration::from_secs(300))
            .await
            .expect("set");

        harness.clock.advance_seconds(299);
        assert!(harness.cache.get(&k).await.expect("get").is_some());

        harness.clock.advance_seconds(1);
        assert!(harness.cache.get(&k).await.expect("get").is_none());
        assert!(harness.cache.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn scan_skips_expired_and_foreign_keys(harness: Harness) {
        let ttl = Duration::from_secs(60);
        for (raw, lifetime) in [
            ("users:list:limit=50&offset=0", ttl),
            ("users:list:limit=10&offset=0", Duration::from_secs(5)),
            ("users:get:1", ttl),
        ] {
            harness.cache.set(&key(raw), b"[]", lifetime).await.expect("set");
        }
        harness.clock.advance_seconds(10);

        let keys = harness
            .cache
            .scan_prefix("users:list:")
            .await
            .expect("scan");

        assert_eq!(keys, vec![key("users:list:limit=50&offset=0")]);
    }

    #[rstest]
    #[tokio::test]
    async fn set_replaces_and_delete_is_idempotent(harness: Harness) {
        let k = key("users:get:2");
        let ttl = Duration::from_secs(60);
        harness.cache.set(&k, b"old", ttl).await.expect("set");
        harness.cache.set(&k, b"new", ttl).await.expect("set");

        assert_eq!(
            harness.cache.get(&k).await.expect("get"),
            Some(b"new".to_vec())
        );

        harness.cache.delete(&k).await.expect("delete");
        harness.cache.delete(&k).await.expect("delete again");
        assert!(harness.cache.get(&k).await.expect("get").is_none());
    }
}
