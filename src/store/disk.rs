use crate::core::cache::Cache;
use crate::core::error::CacheError;
use crate::store::lock::DataDirLock;
use async_trait::async_trait;
use fjall::PartitionHandle;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<SystemTime>,
}

/// Cache stored in a fjall partition. Every handle opened on the same
/// keyspace sees the same entries, and entries outlive the process.
pub struct DiskCache<K, V> {
    partition: PartitionHandle,
    _dir_lock: Option<Arc<DataDirLock>>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> DiskCache<K, V> {
    pub fn new(partition: PartitionHandle) -> Self {
        Self {
            partition,
            _dir_lock: None,
            _marker: PhantomData,
        }
    }

    /// Keeps the data directory locked for as long as this cache lives.
    pub fn holding(mut self, lock: Arc<DataDirLock>) -> Self {
        self._dir_lock = Some(lock);
        self
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for DiskCache<K, V>
where
    K: Send + Sync + Serialize + Debug + 'static,
    V: Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<V>, CacheError> {
        let raw_key = serde_json::to_vec(key)?;
        let Some(value) = self.partition.get(&raw_key)? else {
            debug!("Cache MISS for key: {:?}", key);
            return Ok(None);
        };

        let entry: CacheEntry<V> = serde_json::from_slice(&value)?;
        if let Some(expires_at) = entry.expires_at {
            if SystemTime::now() >= expires_at {
                debug!("Cache entry expired for key: {:?}", key);
                self.partition.remove(raw_key)?;
                return Ok(None);
            }
        }
        debug!("Cache HIT for key: {:?}", key);
        Ok(Some(entry.value))
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|d| SystemTime::now() + d);
        let entry = CacheEntry { value, expires_at };
        self.partition
            .insert(serde_json::to_vec(&key)?, serde_json::to_vec(&entry)?)?;
        debug!("Cache PUT for key: {:?}", key);
        Ok(())
    }

    async fn remove(&self, key: &K) -> Result<(), CacheError> {
        self.partition.remove(serde_json::to_vec(key)?)?;
        debug!("Cache REMOVE for key: {:?}", key);
        Ok(())
    }
}
