//! Error types for pricing, storage and trading

use crate::core::model::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// The price provider could not deliver a usable rate. Every variant means
/// "provider unavailable" to callers; the variants only say why.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Price provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Price provider returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Price provider response could not be parsed: {0}")]
    Parse(String),

    #[error("Price provider response has no rate for {0}")]
    MissingRate(String),

    #[error("Price provider returned an unusable rate: {0}")]
    InvalidRate(Decimal),

    #[error("Price provider did not answer within {0} seconds")]
    Timeout(u64),
}

/// Failure of the key-value store behind the price cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Storage(#[from] fjall::Error),

    #[error("Cache entry encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Failure of the account and transaction store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] fjall::Error),

    #[error("Row encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Data directory {0} is in use by another process")]
    Locked(String),
}

/// Result type alias for trading operations
pub type Result<T> = std::result::Result<T, TradeError>;

/// Typed failures of the trading core. The command layer turns these into
/// user-facing messages.
#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Account already exists: {0}")]
    AccountExists(AccountId),

    #[error("Gold price unavailable: {0}")]
    PriceUnavailable(#[from] ProviderError),

    #[error("Insufficient balance: {required} required, {balance} available")]
    InsufficientBalance { balance: Decimal, required: Decimal },

    #[error("Invalid trade amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Invalid page number {page}, there are {total_pages} page(s)")]
    InvalidPage { page: usize, total_pages: usize },

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),
}

impl TradeError {
    /// Only a missing price is worth retrying after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TradeError::PriceUnavailable(_))
    }
}
