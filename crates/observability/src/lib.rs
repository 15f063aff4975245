//! Logging for sluice binaries.
//!
//! [`LogArgs`] is flattened into a binary's CLI; [`init_logging`] installs the
//! global `tracing` subscriber from it.

mod logging;

pub use logging::{LogArgs, LogFormat, init_logging};
