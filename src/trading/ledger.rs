use super::pricing::PricingPolicy;
use crate::core::error::{Result, TradeError};
use crate::core::ledger::LedgerStore;
use crate::core::model::{Account, AccountId, TradeKind, TransactionRecord, to_cents};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};

/// One mutex per account. Trades on the same account queue up in FIFO order;
/// trades on different accounts never touch each other's lock.
#[derive(Default)]
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: &AccountId) -> OwnedMutexGuard<()> {
        // Clone the handle out so the map shard is not held while waiting
        let lock = self.locks.entry(id.clone()).or_default().clone();
        lock.lock_owned().await
    }
}

/// Applies trades to accounts: prices them, checks the balance and persists
/// the balance change together with the transaction record.
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    pricing: Arc<PricingPolicy>,
    locks: AccountLocks,
    starting_balance: Decimal,
}

impl Ledger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        pricing: Arc<PricingPolicy>,
        starting_balance: Decimal,
    ) -> Self {
        Self {
            store,
            pricing,
            locks: AccountLocks::new(),
            starting_balance,
        }
    }

    /// Opens the account of a newly registered principal with the starting
    /// balance.
    pub async fn open_account(&self, id: &AccountId) -> Result<Account> {
        let _guard = self.locks.acquire(id).await;
        if self.store.load_account(id).await?.is_some() {
            return Err(TradeError::AccountExists(id.clone()));
        }
        let account = Account::open(id.clone(), self.starting_balance, Utc::now());
        self.store.insert_account(&account).await?;
        info!(account = %id, balance = %account.balance, "Opened account");
        Ok(account)
    }

    pub async fn account(&self, id: &AccountId) -> Result<Account> {
        self.store
            .load_account(id)
            .await?
            .ok_or_else(|| TradeError::AccountNotFound(id.clone()))
    }

    /// Executes a BUY or SELL of `amount` grams at the current effective
    /// price. Either the balance change and the new record are both stored,
    /// or nothing is.
    #[instrument(name = "ExecuteTrade", skip(self, account), fields(account = %account))]
    pub async fn execute(
        &self,
        account: &AccountId,
        kind: TradeKind,
        amount: Decimal,
    ) -> Result<TransactionRecord> {
        if amount <= Decimal::ZERO {
            return Err(TradeError::InvalidAmount(amount));
        }
        // Fail fast before going to the provider
        self.account(account).await?;

        let unit_price = self.pricing.effective_price(kind).await?;
        let total = amount
            .checked_mul(unit_price)
            .map(to_cents)
            .ok_or(TradeError::InvalidAmount(amount))?;
        // Too small to move a cent
        if total.is_zero() {
            return Err(TradeError::InvalidAmount(amount));
        }

        let _guard = self.locks.acquire(account).await;
        let current = self.account(account).await?;

        let new_balance = match kind {
            TradeKind::Buy => {
                if current.balance < total {
                    return Err(TradeError::InsufficientBalance {
                        balance: current.balance,
                        required: total,
                    });
                }
                current.balance - total
            }
            TradeKind::Sell => current
                .balance
                .checked_add(total)
                .ok_or(TradeError::InvalidAmount(amount))?,
        };

        let timestamp = current.next_trade_time(Utc::now());
        let record = TransactionRecord {
            id: current.trade_count + 1,
            account: account.clone(),
            kind,
            amount,
            unit_price,
            timestamp,
        };
        let updated = Account {
            balance: to_cents(new_balance),
            last_trade_at: Some(timestamp),
            trade_count: record.id,
            ..current
        };

        self.store.commit_trade(&updated, &record).await?;
        debug!(seq = record.id, "Trade committed");
        info!(
            %kind,
            %amount,
            %unit_price,
            %total,
            balance = %updated.balance,
            "Trade executed"
        );
        Ok(record)
    }
}
