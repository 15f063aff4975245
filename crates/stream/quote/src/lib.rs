//! STREAM payment quoting.
//!
//! A quote answers whether a payment over a path is safe and on which
//! terms. [`Quoter::quote`] runs one session:
//!
//! 1. validate caller input, before any packet is sent
//! 2. learn the destination asset from a zero-amount probe
//! 3. search the max packet amount, bounding the path rate from the same probes
//! 4. check the probed rate against the minimum rate, including per-packet
//!    rounding loss
//!
//! Configuration follows the [`QuoteConfig`] trait, implemented by
//! [`DefaultQuoteConfig`] and by the [`QuoteArgs`] CLI arguments.

mod args;
mod asset;
mod config;
mod constants;
mod destination;
mod error;
mod max_packet;
mod quote;
mod quoter;
mod rate;

pub use args::QuoteArgs;
pub use asset::AssetResolver;
pub use config::{DefaultQuoteConfig, QuoteConfig};
pub use destination::{
    AssetBinding, Destination, DestinationError, IlpAddress, Invoice, SHARED_SECRET_LEN,
    SharedSecret, StreamCredentials,
};
pub use error::PaymentError;
pub use max_packet::{Ceiling, MaxPacket, MaxPacketDiscoverer};
pub use quote::{PaymentType, Quote, QuoteOptions};
pub use quoter::Quoter;
pub use rate::{ProbedRate, RateProbe, RateValidator, Slippage};
