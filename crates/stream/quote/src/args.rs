//! CLI arguments for quoting configuration.

use core::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::config::QuoteConfig;
use crate::constants::*;

/// Quoting CLI arguments.
#[derive(Debug, Args, Clone, PartialEq, Serialize, Deserialize)]
#[command(next_help_heading = "Quoting")]
#[serde(default)]
pub struct QuoteArgs {
    /// Default slippage as a fraction in [0, 1)
    #[arg(long = "quote.slippage", default_value_t = DEFAULT_SLIPPAGE)]
    pub slippage: f64,

    /// Probes in flight at once
    #[arg(long = "quote.parallelism", default_value_t = DEFAULT_PARALLELISM)]
    pub parallelism: usize,

    /// Per-probe timeout in seconds
    #[arg(long = "quote.probe-timeout", default_value_t = DEFAULT_PROBE_TIMEOUT_SECS)]
    pub probe_timeout_secs: u64,

    /// Retries for temporary probe failures
    #[arg(long = "quote.max-retries", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Maximum rounds of max packet search
    #[arg(long = "quote.max-rounds", default_value_t = DEFAULT_MAX_ROUNDS)]
    pub max_rounds: u32,

    /// Deadline for a whole quoting session in seconds
    #[arg(long = "quote.session-timeout", default_value_t = DEFAULT_SESSION_TIMEOUT_SECS)]
    pub session_timeout_secs: u64,
}

impl Default for QuoteArgs {
    fn default() -> Self {
        Self {
            slippage: DEFAULT_SLIPPAGE,
            parallelism: DEFAULT_PARALLELISM,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            max_rounds: DEFAULT_MAX_ROUNDS,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
        }
    }
}

impl QuoteArgs {
    /// Validate argument values.
    pub fn validate(&self) -> Result<(), String> {
        if !self.slippage.is_finite() || !(0.0..1.0).contains(&self.slippage) {
            return Err(format!("slippage must be in [0, 1), got {}", self.slippage));
        }
        if self.parallelism == 0 {
            return Err("parallelism must be at least 1".to_string());
        }
        if self.probe_timeout_secs == 0 || self.session_timeout_secs == 0 {
            return Err("timeouts must be non-zero".to_string());
        }
        if self.probe_timeout_secs > self.session_timeout_secs {
            return Err("probe-timeout must not exceed session-timeout".to_string());
        }
        if self.max_rounds == 0 {
            return Err("max-rounds must be at least 1".to_string());
        }
        Ok(())
    }
}

impl QuoteConfig for QuoteArgs {
    fn default_slippage(&self) -> f64 {
        self.slippage
    }

    fn parallelism(&self) -> usize {
        self.parallelism
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}
