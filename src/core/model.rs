//! Accounts, trades and the money representation shared by every layer

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Number of fractional digits carried by every currency amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Rounds a currency amount to cents and pins its scale, so `7960` is stored
/// and printed as `7960.00`.
pub fn to_cents(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_SCALE);
    rounded
}

/// Identity of an account, as handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        if id.is_empty() {
            anyhow::bail!("Account id must not be empty");
        }
        // NUL separates the id from the sequence number in storage keys
        if id.contains('\0') {
            anyhow::bail!("Account id must not contain NUL characters");
        }
        Ok(AccountId(id.to_string()))
    }
}

impl TryFrom<String> for AccountId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TradeKind::Buy => "BUY",
                TradeKind::Sell => "SELL",
            }
        )
    }
}

impl FromStr for TradeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TradeKind::Buy),
            "SELL" => Ok(TradeKind::Sell),
            _ => Err(anyhow::anyhow!("Invalid trade type: {}", s)),
        }
    }
}

/// A principal's cash account. Only the ledger mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Decimal,
    pub opened_at: DateTime<Utc>,
    pub last_trade_at: Option<DateTime<Utc>>,
    /// Applied trades so far; the next record gets `trade_count + 1`.
    pub trade_count: u64,
}

impl Account {
    pub fn open(id: AccountId, starting_balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            id,
            balance: to_cents(starting_balance),
            opened_at: now,
            last_trade_at: None,
            trade_count: 0,
        }
    }

    /// Execution time for the next trade. Never earlier than the previous one,
    /// even if the wall clock stepped back.
    pub fn next_trade_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.last_trade_at {
            Some(last) if last > now => last,
            _ => now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Per-account sequence number, starting at 1.
    pub id: u64,
    pub account: AccountId,
    pub kind: TradeKind,
    /// Grams of gold traded.
    pub amount: Decimal,
    /// Effective price per gram at execution, commission included.
    pub unit_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Cash moved by this trade, in cents.
    pub fn total(&self) -> Decimal {
        to_cents(self.amount * self.unit_price)
    }
}

/// One page of an account's transaction log, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub records: Vec<TransactionRecord>,
    pub page: usize,
    pub total_count: usize,
    pub total_pages: usize,
}
