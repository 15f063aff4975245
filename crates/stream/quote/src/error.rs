//! Payment error taxonomy.

/// Why a payment could not be set up or quoted.
///
/// Every variant carries a human-readable reason. [`PaymentError::code`]
/// returns the stable variant name for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, strum::IntoStaticStr)]
pub enum PaymentError {
    /// Payment pointer is malformed.
    #[error("invalid payment pointer: {0}")]
    InvalidPaymentPointer(String),

    /// Resolved STREAM credentials are invalid.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Amount to send is not a positive integer within range.
    #[error("invalid source amount: {0}")]
    InvalidSourceAmount(String),

    /// Amount to deliver is not a positive integer within range.
    #[error("invalid destination amount: {0}")]
    InvalidDestinationAmount(String),

    /// Slippage is not a finite number in `[0, 1)`.
    #[error("invalid slippage: {0}")]
    InvalidSlippage(String),

    /// No amount to send, amount to deliver or invoice, or more than one.
    #[error("unknown payment target: {0}")]
    UnknownPaymentTarget(String),

    /// Source asset missing or malformed.
    #[error("unknown source asset: {0}")]
    UnknownSourceAsset(String),

    /// Resolving the destination failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Invoice has nothing left to deliver.
    #[error("invoice already paid: {0}")]
    InvoiceAlreadyPaid(String),

    /// Could not establish a connection to the receiver.
    #[error("establishment failed: {0}")]
    EstablishmentFailed(String),

    /// Receiver declared conflicting assets.
    #[error("destination asset conflict: {0}")]
    DestinationAssetConflict(String),

    /// Receiver never declared its asset and none was supplied.
    #[error("unknown destination asset: {0}")]
    UnknownDestinationAsset(String),

    /// Exchange rate probing produced no usable result.
    #[error("rate probe failed: {0}")]
    RateProbeFailed(String),

    /// Path cannot carry a payment, e.g. a max packet amount of zero.
    #[error("connector error: {0}")]
    ConnectorError(String),

    /// Price table cannot produce a reference rate.
    #[error("external rate unavailable: {0}")]
    ExternalRateUnavailable(String),

    /// Path rate cannot honour the minimum exchange rate.
    #[error("insufficient exchange rate: {0}")]
    InsufficientExchangeRate(String),
}

impl PaymentError {
    /// Stable name of the error kind, e.g. `"InsufficientExchangeRate"`.
    pub fn code(&self) -> &'static str {
        self.into()
    }

    /// Human-readable reason.
    pub fn reason(&self) -> &str {
        match self {
            Self::InvalidPaymentPointer(reason)
            | Self::InvalidCredentials(reason)
            | Self::InvalidSourceAmount(reason)
            | Self::InvalidDestinationAmount(reason)
            | Self::InvalidSlippage(reason)
            | Self::UnknownPaymentTarget(reason)
            | Self::UnknownSourceAsset(reason)
            | Self::QueryFailed(reason)
            | Self::InvoiceAlreadyPaid(reason)
            | Self::EstablishmentFailed(reason)
            | Self::DestinationAssetConflict(reason)
            | Self::UnknownDestinationAsset(reason)
            | Self::RateProbeFailed(reason)
            | Self::ConnectorError(reason)
            | Self::ExternalRateUnavailable(reason)
            | Self::InsufficientExchangeRate(reason) => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_variant_name() {
        let err = PaymentError::InsufficientExchangeRate("too close".into());
        assert_eq!(err.code(), "InsufficientExchangeRate");
        assert_eq!(err.reason(), "too close");
        assert_eq!(err.to_string(), "insufficient exchange rate: too close");
    }
}
