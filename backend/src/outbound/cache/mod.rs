//! Cache adapters implementing the `CacheStore` port.
//!
//! - `RedisCacheStore`: shared Redis backend pooled through `bb8-redis`.
//! - `MemoryCacheStore`: process-local map with clock-driven expiry, used
//!   when no Redis URL is configured and in tests.

mod memory_store;
mod redis_store;

pub use memory_store::MemoryCacheStore;
pub use redis_store::RedisCacheStore;
