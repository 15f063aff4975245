//! Test utilities for sluice crates.
//!
//! Each type is a separate [`ProbeChannel`](sluice_probe::ProbeChannel)
//! implementation:
//!
//! - [`SimulatedPath`] - a path with a rate, an optional packet cap and a
//!   receiver that declares its asset
//! - [`ScriptedChannel`] - canned replies per amount
//! - [`StalledChannel`] - never replies

mod path;
mod scripted;

pub use path::{SimulatedPath, SimulatedPathBuilder};
pub use scripted::{ScriptedChannel, StalledChannel};
