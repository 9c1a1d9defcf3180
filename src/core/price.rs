//! Price provider abstraction

use crate::core::error::ProviderError;
use crate::core::model::to_cents;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Source of the raw gold quote, in troy units of gold per one unit of the
/// base currency.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_raw_rate(&self) -> Result<Decimal, ProviderError>;

    /// Fetches the quote and converts it to a unit price. Does not cache.
    async fn fetch_price(&self) -> Result<Decimal, ProviderError> {
        let rate = self.fetch_raw_rate().await?;
        rate_to_price(rate)
    }
}

/// Inverts a raw quote into base currency per unit of gold, rounded to cents.
pub fn rate_to_price(rate: Decimal) -> Result<Decimal, ProviderError> {
    if rate <= Decimal::ZERO {
        return Err(ProviderError::InvalidRate(rate));
    }
    let price = Decimal::ONE
        .checked_div(rate)
        .map(to_cents)
        .ok_or(ProviderError::InvalidRate(rate))?;
    if price.is_zero() {
        return Err(ProviderError::InvalidRate(rate));
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rate_to_price() {
        assert_eq!(rate_to_price(dec!(0.0005)).unwrap(), dec!(2000.00));
        assert_eq!(rate_to_price(dec!(0.0005)).unwrap().to_string(), "2000.00");
        assert_eq!(rate_to_price(dec!(0.0003)).unwrap(), dec!(3333.33));
    }

    #[test]
    fn test_rate_to_price_rejects_unusable_rates() {
        assert!(matches!(
            rate_to_price(Decimal::ZERO),
            Err(ProviderError::InvalidRate(_))
        ));
        assert!(matches!(
            rate_to_price(dec!(-0.0005)),
            Err(ProviderError::InvalidRate(_))
        ));
        // A price that rounds to nothing is as useless as no price
        assert!(matches!(
            rate_to_price(dec!(1000)),
            Err(ProviderError::InvalidRate(_))
        ));
    }
}
