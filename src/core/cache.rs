//! Key-value cache abstraction with per-entry expiry

use crate::core::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

/// A key-value store shared by every caller. Expired entries read as absent.
/// A successful `put` is visible to the next `get` from any caller.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, CacheError>;

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn remove(&self, key: &K) -> Result<(), CacheError>;
}
