//! Persistence abstraction for accounts and their transaction logs

use crate::core::error::StoreError;
use crate::core::model::{Account, AccountId, TransactionRecord};
use async_trait::async_trait;

/// Account table plus append-only transaction table.
///
/// Implementations must apply `commit_trade` atomically: after it returns, or
/// after a crash in the middle of it, readers see both the new account row and
/// the new record, or neither.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    /// Inserts a new account row. Callers check for an existing row first.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Writes the updated account row and appends `record` as one unit.
    async fn commit_trade(
        &self,
        account: &Account,
        record: &TransactionRecord,
    ) -> Result<(), StoreError>;

    /// All records of an account from one consistent snapshot, newest first.
    async fn transactions(&self, id: &AccountId) -> Result<Vec<TransactionRecord>, StoreError>;
}
