use crate::core::cache::Cache;
use crate::core::error::{CacheError, StoreError};
use crate::core::ledger::LedgerStore;
use crate::core::model::{Account, AccountId, TransactionRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

struct CacheValue<V> {
    value: V,
    expires_at: Option<Instant>,
}

/// In-memory cache implementation using HashMap and Mutex
pub struct MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, CacheValue<V>>>>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Creates a new MemoryCache instance
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<V>, CacheError> {
        let mut cache = self.inner.lock().await;
        let expired = match cache.get(key) {
            None => {
                debug!("Cache MISS for key: {:?}", key);
                return Ok(None);
            }
            Some(entry) => entry
                .expires_at
                .is_some_and(|expiry| expiry <= Instant::now()),
        };
        if expired {
            debug!("Cache entry expired for key: {:?}", key);
            cache.remove(key);
            return Ok(None);
        }
        debug!("Cache HIT for key: {:?}", key);
        Ok(cache.get(key).map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|duration| Instant::now() + duration);
        let cache_value = CacheValue { value, expires_at };

        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {:?}", key);
        cache.insert(key, cache_value);
        Ok(())
    }

    async fn remove(&self, key: &K) -> Result<(), CacheError> {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!("Cache REMOVE for key: {:?}", key);
        Ok(())
    }
}

struct AccountRows {
    account: Account,
    // Oldest first; reversed on read
    transactions: Vec<TransactionRecord>,
}

/// Ledger store kept in process memory. A single write lock makes every
/// commit atomic and every read a consistent snapshot.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    rows: Arc<RwLock<HashMap<AccountId, AccountRows>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.get(id).map(|r| r.account.clone()))
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        rows.insert(
            account.id.clone(),
            AccountRows {
                account: account.clone(),
                transactions: Vec::new(),
            },
        );
        Ok(())
    }

    async fn commit_trade(
        &self,
        account: &Account,
        record: &TransactionRecord,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&account.id)
            .ok_or_else(|| StoreError::Unavailable(format!("no row for account {}", account.id)))?;
        row.account = account.clone();
        row.transactions.push(record.clone());
        Ok(())
    }

    async fn transactions(&self, id: &AccountId) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(id)
            .map(|r| r.transactions.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}
