pub mod disk;
pub mod ledger;
pub mod lock;
pub mod memory;

use crate::core::error::StoreError;
use disk::DiskCache;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use ledger::FjallLedgerStore;
use lock::DataDirLock;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const ACCOUNTS_PARTITION: &str = "accounts";
const TRANSACTIONS_PARTITION: &str = "transactions";
const CACHE_PARTITION: &str = "cache";

/// On-disk keyspace holding the ledger tables and the shared price cache.
///
/// Only one `Storage` may have a data directory open at a time, across
/// processes. Every store handed out keeps the directory lock alive, so the
/// lock is released only after the last handle into the keyspace is gone.
pub struct Storage {
    keyspace: Keyspace,
    accounts: PartitionHandle,
    transactions: PartitionHandle,
    cache: PartitionHandle,
    // Dropped last
    lock: Arc<DataDirLock>,
}

impl Storage {
    /// Opens the data directory, failing at once if another handle holds it.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_wait(path, Duration::ZERO)
    }

    /// Opens the data directory, waiting up to `lock_wait` for its current
    /// holder to close it.
    pub fn open_with_wait(path: &Path, lock_wait: Duration) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|e| {
            StoreError::Unavailable(format!("cannot create {}: {e}", path.display()))
        })?;
        let lock = Arc::new(DataDirLock::acquire(path, lock_wait)?);

        let keyspace = fjall::Config::new(path).open()?;
        let accounts =
            keyspace.open_partition(ACCOUNTS_PARTITION, PartitionCreateOptions::default())?;
        let transactions =
            keyspace.open_partition(TRANSACTIONS_PARTITION, PartitionCreateOptions::default())?;
        let cache = keyspace.open_partition(CACHE_PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened storage at {}", path.display());

        Ok(Self {
            keyspace,
            accounts,
            transactions,
            cache,
            lock,
        })
    }

    pub fn ledger_store(&self) -> FjallLedgerStore {
        FjallLedgerStore::new(
            self.keyspace.clone(),
            self.accounts.clone(),
            self.transactions.clone(),
            Arc::clone(&self.lock),
        )
    }

    pub fn price_store(&self) -> DiskCache<String, String> {
        DiskCache::new(self.cache.clone()).holding(Arc::clone(&self.lock))
    }

    /// Flushes everything to disk. Trades are already synced on commit; this
    /// covers cache writes.
    pub fn shutdown(self) -> Result<(), StoreError> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Storage flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::LedgerStore;
    use crate::core::model::{Account, AccountId};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_second_open_is_refused_while_held() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        assert!(matches!(
            Storage::open(dir.path()),
            Err(StoreError::Locked(_))
        ));

        storage.shutdown().unwrap();
        assert!(Storage::open(dir.path()).is_ok());
    }

    #[tokio::test]
    async fn test_handed_out_stores_keep_the_directory_locked() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let store = storage.ledger_store();
        let cache = storage.price_store();
        storage.shutdown().unwrap();

        // The ledger store still writes into this keyspace
        let id: AccountId = "alice".parse().unwrap();
        store
            .insert_account(&Account::open(id.clone(), dec!(100), Utc::now()))
            .await
            .unwrap();
        assert!(matches!(
            Storage::open(dir.path()),
            Err(StoreError::Locked(_))
        ));

        drop(store);
        drop(cache);
        let reopened = Storage::open(dir.path()).unwrap();
        let loaded = reopened.ledger_store().load_account(&id).await.unwrap();
        assert_eq!(loaded.unwrap().balance, dec!(100.00));
    }

    #[test]
    fn test_waiting_open_succeeds_after_release() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        let path = dir.path().to_path_buf();
        let waiter = std::thread::spawn(move || {
            Storage::open_with_wait(&path, Duration::from_secs(10)).is_ok()
        });
        std::thread::sleep(Duration::from_millis(200));
        assert!(!waiter.is_finished());

        storage.shutdown().unwrap();
        assert!(waiter.join().unwrap());
    }
}
