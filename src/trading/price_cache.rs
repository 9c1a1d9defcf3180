use crate::core::cache::Cache;
use crate::core::error::CacheError;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Key of the market price in the shared cache store.
pub const PRICE_KEY: &str = "gold_price";

/// The process-wide market price, kept as a decimal string in a shared store.
///
/// Nothing is remembered locally: an absent or expired entry always reads as a
/// miss so that the caller goes back to the provider.
#[derive(Clone)]
pub struct PriceCache {
    store: Arc<dyn Cache<String, String>>,
}

impl PriceCache {
    pub fn new(store: Arc<dyn Cache<String, String>>) -> Self {
        Self { store }
    }

    /// Returns the cached price, or `None` when absent, expired or unusable.
    pub async fn get(&self) -> Option<Decimal> {
        let key = PRICE_KEY.to_string();
        let raw = match self.store.get(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Price cache read failed, treating as miss");
                return None;
            }
        };

        match Decimal::from_str(&raw) {
            Ok(price) if price > Decimal::ZERO => {
                debug!(%price, "Cached gold price");
                Some(price)
            }
            // Not removed; the next refresh overwrites it
            _ => {
                warn!(value = %raw, "Ignoring unusable cached gold price");
                None
            }
        }
    }

    /// Stores `price` for `ttl`. Visible to every reader once this returns.
    pub async fn set(&self, price: Decimal, ttl: Duration) -> Result<(), CacheError> {
        self.store
            .put(PRICE_KEY.to_string(), price.to_string(), Some(ttl))
            .await
    }
}
