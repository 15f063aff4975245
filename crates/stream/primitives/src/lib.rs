//! Core primitive types for STREAM payment quoting.
//!
//! This crate provides the numeric and identity types shared across the
//! quoting stack, kept separate to avoid circular dependencies.
//!
//! - [`Amount`] - bounded non-negative integer with checked arithmetic
//! - [`Asset`] - asset code and scale
//! - [`Ratio`] - exact exchange rate

mod amount;
mod asset;
mod rate;

pub use amount::{Amount, AmountError, AmountInput, Rounding};
pub use asset::{Asset, AssetError, AssetInput};
pub use rate::{RateError, Ratio};

pub use num_bigint::BigUint;
