use crate::core::config::AppConfig;
use crate::core::error::TradeError;
use crate::core::ledger::LedgerStore;
use crate::core::price::RateProvider;
use crate::providers::MetalsApiProvider;
use crate::store::Storage;
use crate::trading::{HistoryReader, Ledger, PriceCache, PricingPolicy};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

/// The trading services wired together over one storage keyspace.
///
/// Built once at startup and handed to whatever serves requests; `shutdown`
/// flushes the storage on the way out.
pub struct App {
    storage: Storage,
    pub pricing: Arc<PricingPolicy>,
    pub ledger: Ledger,
    pub history: HistoryReader,
    pub currency: String,
}

impl App {
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let provider = MetalsApiProvider::new(&config.provider)?;
        Self::with_provider(config, Arc::new(provider)).await
    }

    /// Opens the data directory, waiting for any other command that holds it.
    pub async fn with_provider(
        config: &AppConfig,
        provider: Arc<dyn RateProvider>,
    ) -> Result<Self> {
        let data_path = config.default_data_path()?;
        let lock_wait = config.lock_wait();
        let open_path = data_path.clone();
        let storage =
            tokio::task::spawn_blocking(move || Storage::open_with_wait(&open_path, lock_wait))
                .await
                .context("Storage open task failed")?
                .map_err(TradeError::PersistenceFailure)
                .with_context(|| format!("Failed to open storage at {}", data_path.display()))?;

        let pricing = Arc::new(PricingPolicy::new(
            PriceCache::new(Arc::new(storage.price_store())),
            provider,
            config.trading.commission_rate,
            config.trading.price_ttl(),
            config.provider.fetch_budget(),
        ));
        let store: Arc<dyn LedgerStore> = Arc::new(storage.ledger_store());
        let ledger = Ledger::new(
            Arc::clone(&store),
            Arc::clone(&pricing),
            config.trading.starting_balance,
        );
        let history = HistoryReader::new(store, config.trading.page_size);
        debug!("Trading services ready");

        Ok(Self {
            storage,
            pricing,
            ledger,
            history,
            currency: config.provider.base_currency.clone(),
        })
    }

    pub fn shutdown(self) -> Result<()> {
        self.storage
            .shutdown()
            .context("Failed to flush storage on shutdown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::StoreError;
    use crate::core::model::{AccountId, TradeKind};
    use crate::trading::testing::FakeProvider;
    use rust_decimal_macros::dec;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> AppConfig {
        AppConfig {
            data_path: Some(dir.path().to_string_lossy().into_owned()),
            lock_wait_secs: 30,
            ..AppConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_apps_on_one_directory_lose_no_trades() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);
        let provider = Arc::new(FakeProvider::new(dec!(0.0005)));
        let id: AccountId = "alice".parse().unwrap();

        let app = App::with_provider(&config, provider.clone()).await.unwrap();
        app.ledger.open_account(&id).await.unwrap();
        app.shutdown().unwrap();

        // Each app sells 1 gram 20 times; the second waits for the first
        let sessions: Vec<_> = (0..2)
            .map(|_| {
                let config = config.clone();
                let provider = provider.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let app = App::with_provider(&config, provider).await.unwrap();
                    let trades =
                        (0..20).map(|_| app.ledger.execute(&id, TradeKind::Sell, dec!(1)));
                    for result in futures::future::join_all(trades).await {
                        result.unwrap();
                    }
                    app.shutdown().unwrap();
                })
            })
            .collect();
        for session in sessions {
            session.await.unwrap();
        }

        let app = App::with_provider(&config, provider.clone()).await.unwrap();
        let account = app.ledger.account(&id).await.unwrap();
        assert_eq!(account.balance, dec!(10000.00) + dec!(40) * dec!(1960.00));
        assert_eq!(account.trade_count, 40);
        let history = app.history.list_with_size(&id, 1, 100).await.unwrap();
        assert_eq!(history.total_count, 40);
        // The price cached on disk served both sessions
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        app.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_open_gives_up_while_directory_is_held() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            lock_wait_secs: 0,
            ..config_for(&dir)
        };
        let provider = Arc::new(FakeProvider::new(dec!(0.0005)));

        let held = App::with_provider(&config, provider.clone()).await.unwrap();
        let err = match App::with_provider(&config, provider.clone()).await {
            Ok(_) => panic!("second app opened a held directory"),
            Err(e) => e,
        };
        assert!(matches!(
            err.downcast_ref::<TradeError>(),
            Some(TradeError::PersistenceFailure(StoreError::Locked(_)))
        ));
        held.shutdown().unwrap();

        let reopened = App::with_provider(&config, provider).await.unwrap();
        reopened.shutdown().unwrap();
    }
}
