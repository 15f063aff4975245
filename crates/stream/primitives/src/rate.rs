//! Exact exchange rates.
//!
//! A [`Ratio`] is a non-negative rational over arbitrary-precision integers.
//! Rates are compared by cross-multiplication, so boundary decisions never
//! suffer floating-point rounding. Floats only enter through
//! [`Ratio::from_f64`], which takes the shortest decimal representation of
//! the value, and only leave through [`Ratio::to_f64`] for display.

use core::cmp::Ordering;
use core::fmt;
use core::ops::Mul;

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use rust_decimal::Decimal;

use crate::Amount;

/// Digits after the decimal point when displaying a ratio.
const DISPLAY_PRECISION: u32 = 12;

/// Errors constructing a [`Ratio`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RateError {
    /// Denominator is zero.
    #[error("ratio denominator is zero")]
    ZeroDenominator,

    /// Value is below zero.
    #[error("ratio is negative")]
    Negative,

    /// Value is `NaN` or infinite.
    #[error("ratio is not a finite number")]
    NotFinite,

    /// Value cannot be represented as a decimal.
    #[error("ratio {0} cannot be represented exactly")]
    Unrepresentable(f64),
}

/// Non-negative exact rational, e.g. destination units per source unit.
#[derive(Debug, Clone)]
pub struct Ratio {
    numerator: BigUint,
    denominator: BigUint,
}

impl Ratio {
    /// Create a ratio, failing on a zero denominator.
    pub fn new(
        numerator: impl Into<BigUint>,
        denominator: impl Into<BigUint>,
    ) -> Result<Self, RateError> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(RateError::ZeroDenominator);
        }
        Ok(Self {
            numerator: numerator.into(),
            denominator,
        })
    }

    /// The ratio `0`.
    pub fn zero() -> Self {
        Self {
            numerator: BigUint::zero(),
            denominator: BigUint::one(),
        }
    }

    /// The ratio `1`.
    pub fn one() -> Self {
        Self {
            numerator: BigUint::one(),
            denominator: BigUint::one(),
        }
    }

    /// Ratio of two amounts, e.g. `delivered / sent`.
    pub fn from_amounts(numerator: Amount, denominator: Amount) -> Result<Self, RateError> {
        Self::new(numerator.as_u64(), denominator.as_u64())
    }

    /// Exact ratio of a decimal.
    pub fn from_decimal(value: Decimal) -> Result<Self, RateError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(RateError::Negative);
        }
        let mantissa = value.mantissa().unsigned_abs();
        Self::new(mantissa, BigUint::from(10u32).pow(value.scale()))
    }

    /// Ratio of a finite, non-negative float, using its shortest decimal form.
    ///
    /// `0.0005001` becomes exactly `5001 / 10^7`, not the nearest binary
    /// fraction. Any positive input yields a positive ratio, however small or
    /// large.
    pub fn from_f64(value: f64) -> Result<Self, RateError> {
        if !value.is_finite() {
            return Err(RateError::NotFinite);
        }
        if value < 0.0 {
            return Err(RateError::Negative);
        }
        if value <= 0.0 {
            return Ok(Self::zero());
        }

        // Shortest round-trip form, e.g. `5.001e-4`.
        let formatted = format!("{value:e}");
        let (mantissa, exponent) = formatted
            .split_once('e')
            .ok_or(RateError::Unrepresentable(value))?;
        let exponent = exponent
            .parse::<i32>()
            .map_err(|_| RateError::Unrepresentable(value))?;
        let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let digits = format!("{integer}{fraction}")
            .parse::<BigUint>()
            .map_err(|_| RateError::Unrepresentable(value))?;
        let fraction_digits =
            i32::try_from(fraction.len()).map_err(|_| RateError::Unrepresentable(value))?;

        Ok(Self::new(digits, 1u32)?.scale_pow10(exponent - fraction_digits))
    }

    /// Numerator.
    pub fn numerator(&self) -> &BigUint {
        &self.numerator
    }

    /// Denominator (never zero).
    pub fn denominator(&self) -> &BigUint {
        &self.denominator
    }

    /// Returns true if the ratio is zero.
    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// `1 - self`, or `None` when `self > 1`.
    pub fn complement(&self) -> Option<Self> {
        if self.numerator > self.denominator {
            return None;
        }
        Some(Self {
            numerator: &self.denominator - &self.numerator,
            denominator: self.denominator.clone(),
        })
    }

    /// `1 / self`, or `None` when `self` is zero.
    pub fn reciprocal(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        Some(Self {
            numerator: self.denominator.clone(),
            denominator: self.numerator.clone(),
        })
    }

    /// `self * 10^exponent`. Used to move between asset scales.
    pub fn scale_pow10(&self, exponent: i32) -> Self {
        let factor = BigUint::from(10u32).pow(exponent.unsigned_abs());
        if exponent >= 0 {
            Self {
                numerator: &self.numerator * factor,
                denominator: self.denominator.clone(),
            }
        } else {
            Self {
                numerator: self.numerator.clone(),
                denominator: &self.denominator * factor,
            }
        }
    }

    /// `floor(amount * self)` in arbitrary precision.
    pub fn floor_mul(&self, amount: Amount) -> BigUint {
        amount.to_biguint() * &self.numerator / &self.denominator
    }

    /// `ceil(amount * self)` in arbitrary precision.
    pub fn ceil_mul(&self, amount: Amount) -> BigUint {
        let product = amount.to_biguint() * &self.numerator;
        let quotient = &product / &self.denominator;
        if (&product % &self.denominator).is_zero() {
            quotient
        } else {
            quotient + 1u32
        }
    }

    /// Lowest-terms form.
    pub fn reduced(&self) -> Self {
        let divisor = gcd(self.numerator.clone(), self.denominator.clone());
        if divisor.is_zero() || divisor.is_one() {
            return self.clone();
        }
        Self {
            numerator: &self.numerator / &divisor,
            denominator: &self.denominator / &divisor,
        }
    }

    /// Lossy float approximation, for display and logging only.
    pub fn to_f64(&self) -> f64 {
        let shift = self
            .numerator
            .bits()
            .max(self.denominator.bits())
            .saturating_sub(64);
        let numerator = (&self.numerator >> shift).to_f64().unwrap_or(f64::INFINITY);
        let denominator = (&self.denominator >> shift).to_f64().unwrap_or(f64::INFINITY);
        numerator / denominator
    }
}

fn gcd(mut a: BigUint, mut b: BigUint) -> BigUint {
    while !b.is_zero() {
        let remainder = &a % &b;
        a = b;
        b = remainder;
    }
    a
}

impl PartialEq for Ratio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ratio {}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.numerator * &other.denominator).cmp(&(&other.numerator * &self.denominator))
    }
}

impl Mul for &Ratio {
    type Output = Ratio;

    fn mul(self, rhs: &Ratio) -> Ratio {
        Ratio {
            numerator: &self.numerator * &rhs.numerator,
            denominator: &self.denominator * &rhs.denominator,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = BigUint::from(10u32).pow(DISPLAY_PRECISION);
        let scaled = &self.numerator * &unit / &self.denominator;
        let integer = &scaled / &unit;
        let fraction = (&scaled % &unit).to_string();
        let padded = format!("{fraction:0>width$}", width = DISPLAY_PRECISION as usize);
        let trimmed = padded.trim_end_matches('0');
        if trimmed.is_empty() {
            write!(f, "{integer}")
        } else {
            write!(f, "{integer}.{trimmed}")
        }
    }
}
