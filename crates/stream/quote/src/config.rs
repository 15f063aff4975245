//! Quoting configuration.

use core::time::Duration;

use sluice_primitives::Amount;
use sluice_probe::ProbePolicy;

use crate::constants::*;

/// Configuration for a quoting session.
///
/// # Defaults
///
/// - Slippage: 1%
/// - Parallelism: 4 probes in flight
/// - Probe timeout: 5s, retried twice on temporary failures
/// - Max packet search: 64 rounds
/// - Session timeout: 60s
#[auto_impl::auto_impl(&, Arc)]
pub trait QuoteConfig: Send + Sync {
    /// Slippage used when the caller does not supply one.
    fn default_slippage(&self) -> f64;

    /// Probes in flight at once.
    fn parallelism(&self) -> usize;

    /// Deadline for a single probe attempt.
    fn probe_timeout(&self) -> Duration;

    /// Extra attempts for temporary probe failures.
    fn max_retries(&self) -> u32;

    /// Upper bound on max packet search rounds, seed round included.
    fn max_rounds(&self) -> u32;

    /// Deadline for a whole quoting session.
    fn session_timeout(&self) -> Duration;

    /// Amounts sent to learn the destination asset.
    fn asset_probe_amounts(&self) -> Vec<Amount> {
        vec![Amount::new(DEFAULT_ASSET_PROBE_AMOUNT)]
    }

    /// Probe round policy derived from this configuration.
    fn probe_policy(&self) -> ProbePolicy {
        ProbePolicy {
            parallelism: self.parallelism(),
            probe_timeout: self.probe_timeout(),
            max_retries: self.max_retries(),
        }
    }
}

/// Default quoting configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQuoteConfig;

impl QuoteConfig for DefaultQuoteConfig {
    fn default_slippage(&self) -> f64 {
        DEFAULT_SLIPPAGE
    }

    fn parallelism(&self) -> usize {
        DEFAULT_PARALLELISM
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS)
    }

    fn max_retries(&self) -> u32 {
        DEFAULT_MAX_RETRIES
    }

    fn max_rounds(&self) -> u32 {
        DEFAULT_MAX_ROUNDS
    }

    fn session_timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS)
    }
}
