use super::price_cache::PriceCache;
use crate::core::error::{ProviderError, Result};
use crate::core::model::{TradeKind, to_cents};
use crate::core::price::RateProvider;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Market price with the prices a trader would pay or receive right now.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub market: Decimal,
    pub buy: Decimal,
    pub sell: Decimal,
}

/// Derives trade prices from the cached market price and a commission rate.
pub struct PricingPolicy {
    cache: PriceCache,
    provider: Arc<dyn RateProvider>,
    commission_rate: Decimal,
    ttl: Duration,
    fetch_timeout: Duration,
    // Held across check-fetch-store so only one refresh runs at a time
    refresh_guard: Mutex<()>,
}

impl PricingPolicy {
    pub fn new(
        cache: PriceCache,
        provider: Arc<dyn RateProvider>,
        commission_rate: Decimal,
        ttl: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            provider,
            commission_rate,
            ttl,
            fetch_timeout,
            refresh_guard: Mutex::new(()),
        }
    }

    /// Current market price per gram, from the cache or a fresh fetch.
    ///
    /// A failed fetch leaves the cache as it was.
    pub async fn market_price(&self) -> Result<Decimal> {
        if let Some(price) = self.cache.get().await {
            return Ok(price);
        }

        let _guard = self.refresh_guard.lock().await;
        // Another caller may have refreshed while this one waited
        if let Some(price) = self.cache.get().await {
            debug!("Gold price refreshed by a concurrent request");
            return Ok(price);
        }

        let price = match tokio::time::timeout(self.fetch_timeout, self.provider.fetch_price()).await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "Gold price fetch timed out"
                );
                return Err(ProviderError::Timeout(self.fetch_timeout.as_secs()).into());
            }
        };

        if let Err(e) = self.cache.set(price, self.ttl).await {
            warn!(error = %e, "Failed to cache gold price");
        }
        info!(%price, ttl_secs = self.ttl.as_secs(), "Refreshed gold price");
        Ok(price)
    }

    /// Applies the commission against the trader: added on BUY, taken off on
    /// SELL.
    pub fn apply_commission(&self, market_price: Decimal, kind: TradeKind) -> Decimal {
        let factor = match kind {
            TradeKind::Buy => Decimal::ONE + self.commission_rate,
            TradeKind::Sell => Decimal::ONE - self.commission_rate,
        };
        to_cents(market_price * factor)
    }

    pub async fn effective_price(&self, kind: TradeKind) -> Result<Decimal> {
        let market = self.market_price().await?;
        Ok(self.apply_commission(market, kind))
    }

    pub async fn quote(&self) -> Result<Quote> {
        let market = self.market_price().await?;
        Ok(Quote {
            market,
            buy: self.apply_commission(market, TradeKind::Buy),
            sell: self.apply_commission(market, TradeKind::Sell),
        })
    }
}
