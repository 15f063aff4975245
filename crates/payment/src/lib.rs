//! Payment setup over STREAM.
//!
//! [`setup_payment`] turns a [`PaymentTarget`] into a [`PaymentSession`]:
//! the target is resolved into credentials through a
//! [`DestinationResolver`], validated into a
//! [`Destination`](sluice_quote::Destination), connected through a
//! [`ProbeConnector`] and probed for its asset. Quotes are then requested
//! with [`PaymentSession::start_quote`].
//!
//! HTTP resolution and the STREAM transport are outside this crate; they
//! plug in through the two traits. [`StaticResolver`] and
//! [`StaticConnector`] are in-memory implementations.

mod connector;
mod resolver;
mod session;
mod target;

pub use connector::{ConnectError, ProbeConnector, StaticConnector};
pub use resolver::{DestinationResolver, ResolveError, StaticResolver};
pub use session::{PaymentSession, PaymentSetup, setup_payment};
pub use target::{PaymentPointer, PaymentTarget, ResolveTarget};

pub use sluice_quote::{PaymentError, Quote, QuoteOptions};
