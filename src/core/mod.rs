//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod error;
pub mod ledger;
pub mod log;
pub mod model;
pub mod price;

// Re-export main types for cleaner imports
pub use cache::Cache;
pub use error::{CacheError, ProviderError, StoreError, TradeError};
pub use ledger::LedgerStore;
pub use model::{Account, AccountId, HistoryPage, TradeKind, TransactionRecord};
pub use price::RateProvider;
