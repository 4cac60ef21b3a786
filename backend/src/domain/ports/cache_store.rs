//! Port interface for the shared key/value cache in front of the user store.
use std::time::Duration;

use async_trait::async_trait;

use super::{CacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by the caching adapter.
    pub enum CacheStoreError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "cache backend failure: {message}",
    }
}

/// Byte-oriented cache with per-entry expiry.
///
/// Entries must never be served after their TTL elapses. Capacity management
/// is left to the backend.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the entry stored under `key`, if any.
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheStoreError>;

    /// Store `value` under `key`, replacing any existing entry.
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration)
    -> Result<(), CacheStoreError>;

    /// Remove the entry under `key`; missing keys are not an error.
    async fn delete(&self, key: &CacheKey) -> Result<(), CacheStoreError>;

    /// Enumerate live keys starting with `prefix`.
    ///
    /// Adapters must iterate incrementally (e.g. Redis `SCAN`) rather than
    /// issuing blocking whole-keyspace commands.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<CacheKey>, CacheStoreError>;
}
