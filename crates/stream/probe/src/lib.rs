//! Probing a STREAM path with unfulfillable test packets.
//!
//! A probe is an ILP prepare the receiver will not fulfill; its reject still
//! tells the sender how much arrived, whether the packet was too large, and
//! which asset the receiver declares. This crate defines the transport seam
//! ([`ProbeChannel`]), the reply model, and [`Prober`], which owns the policy
//! for sending a round of probes concurrently.

mod channel;
mod code;
mod frame;
mod metrics;
mod reply;
mod round;

pub use channel::{ProbeChannel, ProbeError};
pub use code::{ErrorClass, IlpErrorCode};
pub use frame::Frame;
pub use reply::{
    MaxAmountHint, MaxAmountMetadata, ProbeOutcome, ProbeReply, ProbeResult, RejectInfo,
};
pub use round::{ProbePolicy, Prober};
