//! Payment targets.

use core::fmt;
use core::str::FromStr;

use sluice_quote::{PaymentError, StreamCredentials};
use url::Url;

/// Path of the SPSP endpoint for a pointer without a path.
const WELL_KNOWN_PATH: &str = "/.well-known/pay";

/// Where a payment goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentTarget {
    /// `$host/path`, resolved over SPSP.
    PaymentPointer(PaymentPointer),
    /// Open Payments incoming payment URL.
    InvoiceUrl(Url),
    /// STREAM credentials obtained out of band. Resolved locally.
    Credentials(StreamCredentials),
}

impl PaymentTarget {
    /// Parse a payment pointer target.
    pub fn pointer(pointer: &str) -> Result<Self, PaymentError> {
        Ok(Self::PaymentPointer(pointer.parse()?))
    }
}

/// Endpoint a [`DestinationResolver`](crate::DestinationResolver) queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolveTarget {
    /// SPSP endpoint of a payment pointer.
    Spsp(Url),
    /// Incoming payment URL.
    Invoice(Url),
}

impl ResolveTarget {
    pub fn url(&self) -> &Url {
        match self {
            Self::Spsp(url) | Self::Invoice(url) => url,
        }
    }
}

impl fmt::Display for ResolveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url().as_str())
    }
}

/// Payment pointer, e.g. `$wallet.example/alice`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentPointer {
    pointer: String,
    endpoint: Url,
}

impl PaymentPointer {
    /// The pointer as written.
    pub fn as_str(&self) -> &str {
        &self.pointer
    }

    /// `https` endpoint the pointer resolves to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl FromStr for PaymentPointer {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PaymentError::InvalidPaymentPointer(format!("{s:?}: {reason}"));

        let rest = s.strip_prefix('$').ok_or_else(|| invalid("must start with '$'"))?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(invalid("missing host"));
        }
        if rest.chars().any(|c| c.is_whitespace()) {
            return Err(invalid("contains whitespace"));
        }

        let mut endpoint =
            Url::parse(&format!("https://{rest}")).map_err(|err| invalid(&err.to_string()))?;
        if endpoint.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host"));
        }
        if !endpoint.username().is_empty() || endpoint.password().is_some() {
            return Err(invalid("must not contain credentials"));
        }
        if endpoint.query().is_some() || endpoint.fragment().is_some() {
            return Err(invalid("must not contain a query or fragment"));
        }
        if endpoint.path() == "/" {
            endpoint.set_path(WELL_KNOWN_PATH);
        }

        Ok(Self {
            pointer: s.to_owned(),
            endpoint,
        })
    }
}

impl fmt::Display for PaymentPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pointer)
    }
}
