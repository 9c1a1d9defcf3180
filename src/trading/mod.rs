//! Pricing, trade execution and transaction history

pub mod history;
pub mod ledger;
pub mod price_cache;
pub mod pricing;

pub use history::HistoryReader;
pub use ledger::Ledger;
pub use price_cache::PriceCache;
pub use pricing::{PricingPolicy, Quote};
