//! Fixed-precision payment amounts.
//!
//! An [`Amount`] is a non-negative integer bounded to `[0, 2^64 - 1]`.
//! Intermediate arithmetic runs over arbitrary-precision integers and is
//! bounds-checked on the way back, so nothing ever wraps silently.
//!
//! [`AmountInput`] is the single parsing boundary: integers, floats, decimal
//! strings and big integers are all normalised here, and anything negative,
//! fractional, non-finite or above `u64::MAX` is rejected with a typed
//! [`AmountError`].

use core::fmt;
use core::str::FromStr;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

/// 2^64 as an `f64`. Every float at or above it is out of range.
const U64_BOUND_F64: f64 = 18_446_744_073_709_551_616.0;

/// Errors produced while parsing or operating on amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Input value is below zero.
    #[error("amount is negative")]
    Negative,

    /// Input value has a non-zero fractional part.
    #[error("amount is not an integer")]
    Fractional,

    /// Input value is `NaN` or infinite.
    #[error("amount is not a finite number")]
    NotFinite,

    /// Value exceeds `u64::MAX`.
    #[error("amount exceeds {}", u64::MAX)]
    Overflow,

    /// Subtraction would produce a negative value.
    #[error("amount would be negative")]
    Underflow,

    /// Ratio with a zero denominator.
    #[error("division by zero")]
    DivisionByZero,

    /// Input string is not a number at all.
    #[error("malformed amount {0:?}")]
    Malformed(String),
}

/// Rounding mode for ratio scaling, chosen per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round toward zero.
    Floor,
    /// Round away from zero.
    Ceil,
}

/// Non-negative integer amount in `[0, 2^64 - 1]`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(0);
    /// One unit.
    pub const ONE: Self = Self(1);
    /// The u64 bound, `2^64 - 1`.
    pub const MAX: Self = Self(u64::MAX);

    /// Create an amount from a raw u64.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true if the amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is greater than zero.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Widen into an arbitrary-precision integer.
    pub fn to_biguint(self) -> BigUint {
        BigUint::from(self.0)
    }

    /// Narrow an arbitrary-precision integer, failing above `u64::MAX`.
    pub fn try_from_biguint(value: &BigUint) -> Result<Self, AmountError> {
        value.to_u64().map(Self).ok_or(AmountError::Overflow)
    }

    /// `self + other`, failing on overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, AmountError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    /// `self - other`, failing if the result would be negative.
    pub fn checked_sub(self, other: Self) -> Result<Self, AmountError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(AmountError::Underflow)
    }

    /// `self - other`, clamped at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// `self * numerator / denominator` with the given rounding.
    pub fn multiply_ratio(
        self,
        numerator: &BigUint,
        denominator: &BigUint,
        rounding: Rounding,
    ) -> Result<Self, AmountError> {
        if denominator.is_zero() {
            return Err(AmountError::DivisionByZero);
        }

        let product = self.to_biguint() * numerator;
        let quotient = &product / denominator;
        let result = match rounding {
            Rounding::Floor => quotient,
            Rounding::Ceil if (&product % denominator).is_zero() => quotient,
            Rounding::Ceil => quotient + 1u32,
        };

        Self::try_from_biguint(&result)
    }

    /// `ceil(self / divisor)`, failing on a zero divisor.
    pub fn div_ceil(self, divisor: Self) -> Result<u64, AmountError> {
        if divisor.is_zero() {
            return Err(AmountError::DivisionByZero);
        }
        Ok(self.0.div_ceil(divisor.0))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_text(s)
    }
}

impl TryFrom<&BigUint> for Amount {
    type Error = AmountError;

    fn try_from(value: &BigUint) -> Result<Self, Self::Error> {
        Self::try_from_biguint(value)
    }
}

/// Loosely-typed amount as supplied by a caller.
///
/// Every accepted representation is normalised by [`AmountInput::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum AmountInput {
    /// Signed integer.
    Integer(i128),
    /// Floating point number.
    Float(f64),
    /// Decimal string.
    Text(String),
    /// Arbitrary-precision integer.
    Big(BigUint),
}

impl AmountInput {
    /// Normalise into an [`Amount`].
    pub fn parse(&self) -> Result<Amount, AmountError> {
        match self {
            Self::Integer(value) => {
                if *value < 0 {
                    return Err(AmountError::Negative);
                }
                u64::try_from(*value)
                    .map(Amount)
                    .map_err(|_| AmountError::Overflow)
            }
            Self::Float(value) => parse_float(*value),
            Self::Text(text) => parse_text(text),
            Self::Big(value) => Amount::try_from_biguint(value),
        }
    }
}

impl TryFrom<AmountInput> for Amount {
    type Error = AmountError;

    fn try_from(input: AmountInput) -> Result<Self, Self::Error> {
        input.parse()
    }
}

macro_rules! impl_integer_input {
    ($($t:ty)+) => {$(
        impl From<$t> for AmountInput {
            fn from(value: $t) -> Self {
                Self::Integer(i128::from(value))
            }
        }
    )+};
}

impl_integer_input!(u8 u16 u32 u64 i8 i16 i32 i64 i128);

impl From<f64> for AmountInput {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AmountInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<BigUint> for AmountInput {
    fn from(value: BigUint) -> Self {
        Self::Big(value)
    }
}

impl From<Amount> for AmountInput {
    fn from(value: Amount) -> Self {
        Self::Integer(i128::from(value.0))
    }
}

fn parse_float(value: f64) -> Result<Amount, AmountError> {
    if !value.is_finite() {
        return Err(AmountError::NotFinite);
    }
    if value < 0.0 {
        return Err(AmountError::Negative);
    }
    if value.fract() != 0.0 {
        return Err(AmountError::Fractional);
    }
    if value >= U64_BOUND_F64 {
        return Err(AmountError::Overflow);
    }
    // Integral and in range, so the cast is exact.
    Ok(Amount(value as u64))
}

fn parse_text(text: &str) -> Result<Amount, AmountError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Malformed(text.to_owned()));
    }

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    if matches!(
        unsigned.to_ascii_lowercase().as_str(),
        "nan" | "inf" | "infinity"
    ) {
        return Err(AmountError::NotFinite);
    }

    let integer = match unsigned.split_once('.') {
        Some((int, frac)) => {
            if !is_digits(frac) || !(int.is_empty() || is_digits(int)) {
                return Err(AmountError::Malformed(text.to_owned()));
            }
            if frac.bytes().any(|b| b != b'0') {
                return Err(if negative {
                    AmountError::Negative
                } else {
                    AmountError::Fractional
                });
            }
            if int.is_empty() { "0" } else { int }
        }
        None if is_digits(unsigned) => unsigned,
        None => return Err(AmountError::Malformed(text.to_owned())),
    };

    let value = BigUint::from_str(integer).map_err(|_| AmountError::Malformed(text.to_owned()))?;
    if negative && !value.is_zero() {
        return Err(AmountError::Negative);
    }

    Amount::try_from_biguint(&value)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn test_parse_accepts_integers() {
        assert_eq!(AmountInput::from(42u64).parse(), Ok(Amount::new(42)));
        assert_eq!(AmountInput::from("1000").parse(), Ok(Amount::new(1000)));
        assert_eq!(AmountInput::from(" 7 ").parse(), Ok(Amount::new(7)));
        assert_eq!(AmountInput::from(12.0).parse(), Ok(Amount::new(12)));
        assert_eq!(AmountInput::from("5.000").parse(), Ok(Amount::new(5)));
        assert_eq!(
            AmountInput::from("18446744073709551615").parse(),
            Ok(Amount::MAX)
        );
    }

    #[test]
    fn test_parse_rejects_invalid_inputs() {
        assert_matches!(AmountInput::from(-2).parse(), Err(AmountError::Negative));
        assert_matches!(AmountInput::from("-2").parse(), Err(AmountError::Negative));
        assert_matches!(AmountInput::from("3.14").parse(), Err(AmountError::Fractional));
        assert_matches!(AmountInput::from(3.14).parse(), Err(AmountError::Fractional));
        assert_matches!(AmountInput::from(f64::NAN).parse(), Err(AmountError::NotFinite));
        assert_matches!(
            AmountInput::from(f64::INFINITY).parse(),
            Err(AmountError::NotFinite)
        );
        assert_matches!(AmountInput::from("NaN").parse(), Err(AmountError::NotFinite));
        assert_matches!(AmountInput::from("Infinity").parse(), Err(AmountError::NotFinite));
        assert_matches!(AmountInput::from("abc").parse(), Err(AmountError::Malformed(_)));
        assert_matches!(AmountInput::from("").parse(), Err(AmountError::Malformed(_)));
        assert_matches!(AmountInput::from("1e3").parse(), Err(AmountError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert_matches!(
            AmountInput::from("18446744073709551616").parse(),
            Err(AmountError::Overflow)
        );
        assert_matches!(
            AmountInput::from(i128::from(u64::MAX) + 1).parse(),
            Err(AmountError::Overflow)
        );
        assert_matches!(AmountInput::from(1e20).parse(), Err(AmountError::Overflow));

        let big = BigUint::from(u64::MAX) * 3u32;
        assert_matches!(AmountInput::from(big).parse(), Err(AmountError::Overflow));
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::new(10);
        let b = Amount::new(3);
        assert_eq!(a.checked_add(b), Ok(Amount::new(13)));
        assert_eq!(a.checked_sub(b), Ok(Amount::new(7)));
        assert_matches!(b.checked_sub(a), Err(AmountError::Underflow));
        assert_matches!(Amount::MAX.checked_add(Amount::ONE), Err(AmountError::Overflow));
        assert_eq!(b.saturating_sub(a), Amount::ZERO);
    }

    #[test]
    fn test_multiply_ratio_rounding() {
        let amount = Amount::new(10);
        let num = BigUint::from(1u32);
        let den = BigUint::from(3u32);
        assert_eq!(
            amount.multiply_ratio(&num, &den, Rounding::Floor),
            Ok(Amount::new(3))
        );
        assert_eq!(
            amount.multiply_ratio(&num, &den, Rounding::Ceil),
            Ok(Amount::new(4))
        );
        assert_matches!(
            amount.multiply_ratio(&num, &BigUint::zero(), Rounding::Floor),
            Err(AmountError::DivisionByZero)
        );
        assert_matches!(
            Amount::MAX.multiply_ratio(&BigUint::from(2u32), &BigUint::from(1u32), Rounding::Floor),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn test_div_ceil() {
        assert_eq!(Amount::new(10).div_ceil(Amount::new(3)), Ok(4));
        assert_eq!(Amount::new(9).div_ceil(Amount::new(3)), Ok(3));
        assert_matches!(
            Amount::new(9).div_ceil(Amount::ZERO),
            Err(AmountError::DivisionByZero)
        );
    }

    proptest! {
        #[test]
        fn prop_ceil_is_at_most_one_above_floor(value in any::<u64>(), num in 1u64.., den in 1u64..) {
            let amount = Amount::new(value);
            let (num, den) = (BigUint::from(num), BigUint::from(den));
            if let (Ok(floor), Ok(ceil)) = (
                amount.multiply_ratio(&num, &den, Rounding::Floor),
                amount.multiply_ratio(&num, &den, Rounding::Ceil),
            ) {
                prop_assert!(floor <= ceil);
                prop_assert!(ceil.as_u64() - floor.as_u64() <= 1);
            }
        }
    }
}
