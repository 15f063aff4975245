//! Reference exchange rates from caller-supplied prices.
//!
//! Prices are expressed in a common unit of account per *display* unit of an
//! asset. The reference rate between two assets is the cross rate
//!
//! ```text
//! rate = price(source) / price(destination) * 10^(dest.scale - source.scale)
//! ```
//!
//! in destination raw units per source raw unit.

mod table;

pub use table::{PriceTable, PriceTableParseError};

use sluice_primitives::{Asset, Ratio};
use tracing::trace;

/// Errors looking up a price.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriceError {
    /// No price for the asset code.
    #[error("no price for {0}")]
    Missing(String),

    /// Price is zero or negative.
    #[error("price for {code} is not positive: {price}")]
    NonPositive {
        /// Asset code.
        code: String,
        /// Offending price.
        price: f64,
    },

    /// Price is `NaN` or infinite.
    #[error("price for {0} is not finite")]
    NotFinite(String),

    /// Price cannot be converted to an exact ratio.
    #[error("price for {0} cannot be represented exactly")]
    Unrepresentable(String),
}

/// Source of asset prices.
#[auto_impl::auto_impl(&, Arc)]
pub trait PriceOracle: Send + Sync {
    /// Price of one display unit of `code`, strictly positive.
    fn price(&self, code: &str) -> Result<Ratio, PriceError>;
}

/// Cross rate in destination raw units per source raw unit.
pub fn reference_rate(
    oracle: &impl PriceOracle,
    source: &Asset,
    destination: &Asset,
) -> Result<Ratio, PriceError> {
    let source_price = oracle.price(source.code())?;
    if source_price.is_zero() {
        return Err(PriceError::NonPositive {
            code: source.code().to_owned(),
            price: 0.0,
        });
    }
    let destination_price = oracle.price(destination.code())?;
    let per_destination = destination_price
        .reciprocal()
        .ok_or_else(|| PriceError::NonPositive {
            code: destination.code().to_owned(),
            price: 0.0,
        })?;

    let rate = (&source_price * &per_destination).scale_pow10(destination.scale_difference(source));
    trace!(%source, %destination, %rate, "computed reference rate");
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sluice_primitives::{Amount, BigUint};

    #[test]
    fn test_same_asset_is_parity() {
        let prices = PriceTable::new().with_price("USD", 1.0);
        let usd = Asset::new("USD", 9);
        assert_eq!(reference_rate(&prices, &usd, &usd).unwrap(), Ratio::one());
    }

    #[test]
    fn test_cross_rate_accounts_for_scale() {
        // 1 XRP = 0.5 USD; USD at scale 2, XRP at scale 6.
        let prices = PriceTable::new().with_price("USD", 1.0).with_price("XRP", 0.5);
        let usd = Asset::new("USD", 2);
        let xrp = Asset::new("XRP", 6);

        // 1 cent buys 0.02 XRP = 20_000 drops.
        let usd_to_xrp = reference_rate(&prices, &usd, &xrp).unwrap();
        assert_eq!(usd_to_xrp, Ratio::new(20_000u32, 1u32).unwrap());

        // 1_000_000 drops = 1 XRP buys 50 cents.
        let xrp_to_usd = reference_rate(&prices, &xrp, &usd).unwrap();
        assert_eq!(xrp_to_usd.floor_mul(Amount::new(1_000_000)), BigUint::from(50u32));
    }

    #[test]
    fn test_zero_price_is_an_error_for_either_side() {
        let prices = PriceTable::new().with_price("USD", 1.0).with_price("ABC", 0.0);
        let usd = Asset::new("USD", 2);
        let abc = Asset::new("ABC", 2);

        assert_matches!(
            reference_rate(&prices, &usd, &abc),
            Err(PriceError::NonPositive { .. })
        );
        assert_matches!(
            reference_rate(&prices, &abc, &usd),
            Err(PriceError::NonPositive { .. })
        );
    }

    #[test]
    fn test_extreme_prices_never_yield_a_zero_rate() {
        let prices = PriceTable::new()
            .with_price("USD", 1.0)
            .with_price("TINY", 1e-30)
            .with_price("HUGE", 1e30);
        let usd = Asset::new("USD", 2);
        let tiny = Asset::new("TINY", 2);
        let huge = Asset::new("HUGE", 2);

        assert!(!prices.price("TINY").unwrap().is_zero());
        assert!(!prices.price("HUGE").unwrap().is_zero());

        let tiny_to_usd = reference_rate(&prices, &tiny, &usd).unwrap();
        assert!(!tiny_to_usd.is_zero());
        assert_eq!(tiny_to_usd.reciprocal(), Some(reference_rate(&prices, &usd, &tiny).unwrap()));

        let huge_to_tiny = reference_rate(&prices, &huge, &tiny).unwrap();
        assert_eq!(huge_to_tiny, Ratio::new(BigUint::from(10u32).pow(60), 1u32).unwrap());
    }

    #[test]
    fn test_zero_price_from_oracle_is_rejected() {
        struct Broken;
        impl PriceOracle for Broken {
            fn price(&self, _code: &str) -> Result<Ratio, PriceError> {
                Ok(Ratio::zero())
            }
        }
        let usd = Asset::new("USD", 2);
        assert_matches!(
            reference_rate(&Broken, &usd, &usd),
            Err(PriceError::NonPositive { .. })
        );
    }

    #[test]
    fn test_missing_price() {
        let prices = PriceTable::new().with_price("USD", 1.0);
        assert_matches!(
            reference_rate(&prices, &Asset::new("USD", 2), &Asset::new("EUR", 2)),
            Err(PriceError::Missing(code)) if code == "EUR"
        );
    }

    #[test]
    fn test_oracle_through_arc() {
        let prices = std::sync::Arc::new(PriceTable::new().with_price("USD", 2.0));
        assert_eq!(prices.price("USD").unwrap(), Ratio::new(2u32, 1u32).unwrap());
    }
}
