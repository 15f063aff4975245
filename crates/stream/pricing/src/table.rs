//! In-memory price table.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sluice_primitives::Ratio;

use crate::{PriceError, PriceOracle};

/// Asset code to price mapping.
///
/// Entries are stored as given and validated on lookup, so a table may hold
/// a zero or non-finite price without ever yielding a zero rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    prices: HashMap<String, f64>,
}

impl PriceTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_price(mut self, code: impl Into<String>, price: f64) -> Self {
        self.insert(code, price);
        self
    }

    /// Insert or replace a price.
    pub fn insert(&mut self, code: impl Into<String>, price: f64) -> Option<f64> {
        self.prices.insert(code.into(), price)
    }

    /// Number of priced assets.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Returns true if no asset is priced.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceOracle for PriceTable {
    fn price(&self, code: &str) -> Result<Ratio, PriceError> {
        let price = *self
            .prices
            .get(code)
            .ok_or_else(|| PriceError::Missing(code.to_owned()))?;
        if !price.is_finite() {
            return Err(PriceError::NotFinite(code.to_owned()));
        }
        if price <= 0.0 {
            return Err(PriceError::NonPositive {
                code: code.to_owned(),
                price,
            });
        }
        Ratio::from_f64(price).map_err(|_| PriceError::Unrepresentable(code.to_owned()))
    }
}

impl FromIterator<(String, f64)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

/// Error parsing a `CODE=price` list.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid price entry {0:?}, expected CODE=price")]
pub struct PriceTableParseError(String);

/// Parses `USD=1,XRP=0.5`.
impl FromStr for PriceTable {
    type Err = PriceTableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (code, price) = entry
                    .split_once('=')
                    .ok_or_else(|| PriceTableParseError(entry.to_owned()))?;
                let price = price
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| PriceTableParseError(entry.to_owned()))?;
                Ok((code.trim().to_owned(), price))
            })
            .collect()
    }
}
