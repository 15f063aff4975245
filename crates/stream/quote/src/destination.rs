//! Validated payment destinations.

use core::fmt;
use core::str::FromStr;

use sluice_primitives::{Amount, Asset};

/// Longest valid ILP address in bytes.
const MAX_ADDRESS_LEN: usize = 1023;

/// Allocation schemes an ILP address may start with.
const SCHEMES: &[&str] = &[
    "g", "private", "example", "peer", "self", "test", "test1", "test2", "test3", "local",
];

/// Length of a STREAM shared secret.
pub const SHARED_SECRET_LEN: usize = 32;

/// Errors validating destination credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DestinationError {
    /// Address does not follow the ILP address grammar.
    #[error("invalid ILP address {address:?}: {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    /// Shared secret has the wrong length.
    #[error("shared secret must be {SHARED_SECRET_LEN} bytes, got {0}")]
    InvalidSharedSecretLength(usize),

    /// Shared secret is not valid hex.
    #[error("shared secret is not valid hex")]
    InvalidSharedSecretEncoding,
}

/// ILP address, e.g. `g.acme.bob`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IlpAddress(String);

impl IlpAddress {
    /// Validate an address.
    pub fn new(address: impl Into<String>) -> Result<Self, DestinationError> {
        let address = address.into();
        let invalid = |reason| DestinationError::InvalidAddress {
            address: address.clone(),
            reason,
        };

        if address.len() > MAX_ADDRESS_LEN {
            return Err(invalid("longer than 1023 bytes"));
        }
        let mut segments = address.split('.');
        let scheme = segments.next().unwrap_or_default();
        if !SCHEMES.contains(&scheme) {
            return Err(invalid("unknown allocation scheme"));
        }
        let mut has_segment = false;
        for segment in segments {
            has_segment = true;
            if segment.is_empty() {
                return Err(invalid("empty segment"));
            }
            if !segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'~' | b'-'))
            {
                return Err(invalid("invalid character"));
            }
        }
        if !has_segment {
            return Err(invalid("missing segment after scheme"));
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Allocation scheme, the first segment.
    pub fn scheme(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }
}

impl fmt::Display for IlpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IlpAddress {
    type Err = DestinationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// 32-byte STREAM shared secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret([u8; SHARED_SECRET_LEN]);

impl SharedSecret {
    pub fn new(bytes: [u8; SHARED_SECRET_LEN]) -> Self {
        Self(bytes)
    }

    /// Validate the length of a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DestinationError> {
        let bytes: [u8; SHARED_SECRET_LEN] = bytes
            .try_into()
            .map_err(|_| DestinationError::InvalidSharedSecretLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    /// Decode from hex.
    pub fn from_hex(encoded: &str) -> Result<Self, DestinationError> {
        let bytes = hex::decode(encoded.trim_start_matches("0x"))
            .map_err(|_| DestinationError::InvalidSharedSecretEncoding)?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_LEN] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Amounts of an invoice in destination units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invoice {
    /// Total the invoice asks for.
    pub amount_to_deliver: Amount,
    /// Already received towards it.
    pub amount_delivered: Amount,
}

impl Invoice {
    pub fn new(amount_to_deliver: Amount, amount_delivered: Amount) -> Self {
        Self {
            amount_to_deliver,
            amount_delivered,
        }
    }

    /// Amount still owed, `None` once fully paid.
    pub fn remaining(&self) -> Option<Amount> {
        self.amount_to_deliver
            .checked_sub(self.amount_delivered)
            .ok()
            .filter(|remaining| remaining.is_positive())
    }
}

/// How the destination asset became known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AssetBinding {
    /// Not yet known.
    #[default]
    Unbound,
    /// Given by the caller or the resolver.
    Supplied(Asset),
    /// Declared by the receiver in a probe reply.
    Declared(Asset),
}

impl AssetBinding {
    pub fn asset(&self) -> Option<&Asset> {
        match self {
            Self::Unbound => None,
            Self::Supplied(asset) | Self::Declared(asset) => Some(asset),
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, Self::Unbound)
    }
}

/// Unvalidated STREAM credentials as returned by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCredentials {
    pub destination_address: String,
    pub shared_secret: Vec<u8>,
    pub destination_asset: Option<Asset>,
    pub invoice: Option<Invoice>,
}

/// Validated payment destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    address: IlpAddress,
    shared_secret: SharedSecret,
    asset: AssetBinding,
    invoice: Option<Invoice>,
}

impl Destination {
    pub fn new(address: IlpAddress, shared_secret: SharedSecret) -> Self {
        Self {
            address,
            shared_secret,
            asset: AssetBinding::Unbound,
            invoice: None,
        }
    }

    /// Validate resolved credentials. A resolver-provided asset is bound as
    /// supplied.
    pub fn from_credentials(credentials: StreamCredentials) -> Result<Self, DestinationError> {
        let StreamCredentials {
            destination_address,
            shared_secret,
            destination_asset,
            invoice,
        } = credentials;
        let mut destination = Self::new(
            IlpAddress::new(destination_address)?,
            SharedSecret::from_slice(&shared_secret)?,
        );
        if let Some(asset) = destination_asset {
            destination.asset = AssetBinding::Supplied(asset);
        }
        destination.invoice = invoice;
        Ok(destination)
    }

    pub fn with_asset(mut self, binding: AssetBinding) -> Self {
        self.asset = binding;
        self
    }

    pub fn with_invoice(mut self, invoice: Invoice) -> Self {
        self.invoice = Some(invoice);
        self
    }

    pub fn address(&self) -> &IlpAddress {
        &self.address
    }

    pub fn shared_secret(&self) -> &SharedSecret {
        &self.shared_secret
    }

    pub fn asset_binding(&self) -> &AssetBinding {
        &self.asset
    }

    /// Destination asset, if bound.
    pub fn asset(&self) -> Option<&Asset> {
        self.asset.asset()
    }

    pub fn invoice(&self) -> Option<&Invoice> {
        self.invoice.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_address_grammar() {
        for valid in ["g.acme.bob", "test.alice", "private.a-b_c~d", "local.x"] {
            assert!(IlpAddress::new(valid).is_ok(), "{valid}");
        }
        for invalid in ["", "g", "h.acme", "g..bob", "g.acme.", "g.bob smith", "G.acme"] {
            assert_matches!(
                IlpAddress::new(invalid),
                Err(DestinationError::InvalidAddress { .. }),
                "{invalid}"
            );
        }
        let long = format!("g.{}", "a".repeat(MAX_ADDRESS_LEN));
        assert!(IlpAddress::new(long).is_err());
        assert_eq!(IlpAddress::new("test1.x").unwrap().scheme(), "test1");
    }

    #[test]
    fn test_shared_secret() {
        assert!(SharedSecret::from_slice(&[7; 32]).is_ok());
        assert_matches!(
            SharedSecret::from_slice(&[7; 31]),
            Err(DestinationError::InvalidSharedSecretLength(31))
        );
        assert_eq!(
            SharedSecret::from_hex(&"ab".repeat(32)).unwrap(),
            SharedSecret::new([0xab; 32])
        );
        assert_matches!(
            SharedSecret::from_hex("zz"),
            Err(DestinationError::InvalidSharedSecretEncoding)
        );
        assert_eq!(format!("{:?}", SharedSecret::new([1; 32])), "SharedSecret(..)");
    }

    #[test]
    fn test_invoice_remaining() {
        let invoice = Invoice::new(Amount::new(45_601), Amount::new(2_302));
        assert_eq!(invoice.remaining(), Some(Amount::new(43_299)));
        assert_eq!(Invoice::new(Amount::new(200), Amount::new(203)).remaining(), None);
        assert_eq!(Invoice::new(Amount::new(200), Amount::new(200)).remaining(), None);
    }

    #[test]
    fn test_credentials_validation() {
        let credentials = StreamCredentials {
            destination_address: "g.acme.bob".into(),
            shared_secret: vec![1; 32],
            destination_asset: Some(Asset::new("USD", 9)),
            invoice: None,
        };
        let destination = Destination::from_credentials(credentials.clone()).unwrap();
        assert_eq!(destination.asset_binding(), &AssetBinding::Supplied(Asset::new("USD", 9)));
        assert_eq!(destination, Destination::from_credentials(credentials.clone()).unwrap());

        let short = StreamCredentials {
            shared_secret: vec![1; 16],
            ..credentials
        };
        assert!(Destination::from_credentials(short).is_err());
    }
}
