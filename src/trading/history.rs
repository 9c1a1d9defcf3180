use crate::core::error::{Result, TradeError};
use crate::core::ledger::LedgerStore;
use crate::core::model::{AccountId, HistoryPage};
use std::sync::Arc;
use tracing::debug;

/// Read-only, paginated view of an account's transaction log.
pub struct HistoryReader {
    store: Arc<dyn LedgerStore>,
    page_size: usize,
}

impl HistoryReader {
    pub fn new(store: Arc<dyn LedgerStore>, page_size: usize) -> Self {
        Self { store, page_size }
    }

    pub async fn list(&self, account: &AccountId, page: usize) -> Result<HistoryPage> {
        self.list_with_size(account, page, self.page_size).await
    }

    /// Returns page `page` (1-based), most recent records first. An account
    /// without trades has a single empty page.
    pub async fn list_with_size(
        &self,
        account: &AccountId,
        page: usize,
        page_size: usize,
    ) -> Result<HistoryPage> {
        if self.store.load_account(account).await?.is_none() {
            return Err(TradeError::AccountNotFound(account.clone()));
        }

        let records = self.store.transactions(account).await?;
        let total_count = records.len();
        let total_pages = total_count.div_ceil(page_size.max(1)).max(1);
        if page_size == 0 || page < 1 || page > total_pages {
            return Err(TradeError::InvalidPage { page, total_pages });
        }

        let records: Vec<_> = records
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        debug!(
            account = %account,
            page,
            total_count,
            returned = records.len(),
            "Read transaction history"
        );

        Ok(HistoryPage {
            records,
            page,
            total_count,
            total_pages,
        })
    }
}
