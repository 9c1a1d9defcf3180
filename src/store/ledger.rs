use crate::core::error::StoreError;
use crate::core::ledger::LedgerStore;
use crate::core::model::{Account, AccountId, TransactionRecord};
use crate::store::lock::DataDirLock;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use std::sync::Arc;
use tracing::debug;

/// Ledger tables in a fjall keyspace.
///
/// `accounts` maps the account id to its JSON row. `transactions` is keyed by
/// account id, a NUL byte and the big-endian sequence number, so one account's
/// records are contiguous and sorted by insertion order.
#[derive(Clone)]
pub struct FjallLedgerStore {
    keyspace: Keyspace,
    accounts: PartitionHandle,
    transactions: PartitionHandle,
    _lock: Arc<DataDirLock>,
}

fn record_prefix(id: &AccountId) -> Vec<u8> {
    let mut key = id.as_str().as_bytes().to_vec();
    key.push(0);
    key
}

fn record_key(id: &AccountId, seq: u64) -> Vec<u8> {
    let mut key = record_prefix(id);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

impl FjallLedgerStore {
    pub fn new(
        keyspace: Keyspace,
        accounts: PartitionHandle,
        transactions: PartitionHandle,
        lock: Arc<DataDirLock>,
    ) -> Self {
        Self {
            keyspace,
            accounts,
            transactions,
            _lock: lock,
        }
    }
}

#[async_trait]
impl LedgerStore for FjallLedgerStore {
    async fn load_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        match self.accounts.get(id.as_str().as_bytes())? {
            Some(row) => Ok(Some(serde_json::from_slice(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.accounts
            .insert(account.id.as_str().as_bytes(), serde_json::to_vec(account)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(account = %account.id, "Inserted account row");
        Ok(())
    }

    async fn commit_trade(
        &self,
        account: &Account,
        record: &TransactionRecord,
    ) -> Result<(), StoreError> {
        let account_row = serde_json::to_vec(account)?;
        let record_row = serde_json::to_vec(record)?;

        let mut batch = self.keyspace.batch();
        batch.insert(&self.accounts, account.id.as_str().as_bytes(), account_row);
        batch.insert(
            &self.transactions,
            record_key(&record.account, record.id),
            record_row,
        );
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(account = %account.id, seq = record.id, "Committed trade batch");
        Ok(())
    }

    async fn transactions(&self, id: &AccountId) -> Result<Vec<TransactionRecord>, StoreError> {
        // A single iterator reads from one snapshot
        self.transactions
            .prefix(record_prefix(id))
            .rev()
            .map(|item| -> Result<TransactionRecord, StoreError> {
                let (_, value) = item?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }
}
