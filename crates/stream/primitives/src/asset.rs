//! Asset identity.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors validating an asset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetError {
    /// Asset code is empty.
    #[error("asset code is empty")]
    EmptyCode,

    /// Scale is not an integer in `[0, 255]`.
    #[error("invalid asset scale {0}")]
    InvalidScale(String),

    /// Input is not of the form `CODE:scale`.
    #[error("malformed asset {0:?}, expected CODE:scale")]
    Malformed(String),
}

/// Asset code and scale. A raw amount `n` is worth `n / 10^scale` units.
///
/// Two assets are equal iff both code and scale match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    code: String,
    scale: u8,
}

impl Asset {
    /// Create an asset.
    pub fn new(code: impl Into<String>, scale: u8) -> Self {
        Self {
            code: code.into(),
            scale,
        }
    }

    /// Asset code, e.g. `USD`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of decimal places between the raw unit and the display unit.
    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// `self.scale - other.scale` as a signed exponent.
    pub fn scale_difference(&self, other: &Asset) -> i32 {
        i32::from(self.scale) - i32::from(other.scale)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.code, self.scale)
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (code, scale) = s
            .split_once(':')
            .ok_or_else(|| AssetError::Malformed(s.to_owned()))?;
        let code = code.trim();
        if code.is_empty() {
            return Err(AssetError::EmptyCode);
        }
        let scale = scale
            .trim()
            .parse::<u8>()
            .map_err(|_| AssetError::InvalidScale(scale.to_owned()))?;
        Ok(Self::new(code, scale))
    }
}

/// Loosely-typed asset as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetInput {
    /// Already validated asset.
    Asset(Asset),
    /// Code and numeric scale, validated by [`AssetInput::resolve`].
    Raw {
        /// Asset code.
        code: String,
        /// Asset scale; must be an integer in `[0, 255]`.
        scale: f64,
    },
}

impl AssetInput {
    /// Validate into an [`Asset`].
    pub fn resolve(&self) -> Result<Asset, AssetError> {
        let (code, scale) = match self {
            Self::Asset(asset) => return validate_code(asset.code()).map(|_| asset.clone()),
            Self::Raw { code, scale } => (code, *scale),
        };
        validate_code(code)?;
        if !scale.is_finite() || scale.fract() != 0.0 || !(0.0..=255.0).contains(&scale) {
            return Err(AssetError::InvalidScale(scale.to_string()));
        }
        // Integral and within [0, 255].
        Ok(Asset::new(code.trim(), scale as u8))
    }
}

impl From<Asset> for AssetInput {
    fn from(asset: Asset) -> Self {
        Self::Asset(asset)
    }
}

fn validate_code(code: &str) -> Result<(), AssetError> {
    if code.trim().is_empty() {
        return Err(AssetError::EmptyCode);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_equality_requires_code_and_scale() {
        assert_eq!(Asset::new("USD", 9), Asset::new("USD", 9));
        assert_ne!(Asset::new("USD", 9), Asset::new("USD", 6));
        assert_ne!(Asset::new("USD", 9), Asset::new("EUR", 9));
    }

    #[test]
    fn test_parse_and_display() {
        let asset: Asset = "XRP:6".parse().unwrap();
        assert_eq!(asset, Asset::new("XRP", 6));
        assert_eq!(asset.to_string(), "XRP:6");

        assert_matches!("XRP".parse::<Asset>(), Err(AssetError::Malformed(_)));
        assert_matches!(":6".parse::<Asset>(), Err(AssetError::EmptyCode));
        assert_matches!("XRP:256".parse::<Asset>(), Err(AssetError::InvalidScale(_)));
    }

    #[test]
    fn test_raw_input_validation() {
        let raw = |code: &str, scale: f64| AssetInput::Raw {
            code: code.to_owned(),
            scale,
        };

        assert_eq!(raw("USD", 2.0).resolve(), Ok(Asset::new("USD", 2)));
        assert_matches!(raw("USD", f64::NAN).resolve(), Err(AssetError::InvalidScale(_)));
        assert_matches!(raw("USD", f64::INFINITY).resolve(), Err(AssetError::InvalidScale(_)));
        assert_matches!(raw("USD", 256.0).resolve(), Err(AssetError::InvalidScale(_)));
        assert_matches!(raw("USD", -1.0).resolve(), Err(AssetError::InvalidScale(_)));
        assert_matches!(raw("USD", 2.5).resolve(), Err(AssetError::InvalidScale(_)));
        assert_matches!(raw("  ", 2.0).resolve(), Err(AssetError::EmptyCode));
    }

    #[test]
    fn test_scale_difference() {
        let usd = Asset::new("USD", 2);
        let xrp = Asset::new("XRP", 6);
        assert_eq!(xrp.scale_difference(&usd), 4);
        assert_eq!(usd.scale_difference(&xrp), -4);
    }
}
