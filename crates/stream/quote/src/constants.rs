//! Default constants for quoting.

/// Default slippage, as a fraction of the reference rate.
pub(crate) const DEFAULT_SLIPPAGE: f64 = 0.01;

/// Default number of probes in flight at once.
pub(crate) const DEFAULT_PARALLELISM: usize = 4;

/// Default per-probe timeout in seconds.
pub(crate) const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Default retries for temporary probe failures.
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default cap on max packet search rounds.
pub(crate) const DEFAULT_MAX_ROUNDS: u32 = 64;

/// Default deadline for a whole quoting session in seconds.
pub(crate) const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 60;

/// Source amount of the probe used to learn the destination asset.
pub(crate) const DEFAULT_ASSET_PROBE_AMOUNT: u64 = 0;

/// Largest power of ten in the seed round.
pub(crate) const SEED_LADDER_MAX_EXPONENT: u32 = 12;

/// Exponent step of the seed ladder, `10^0, 10^4, 10^8, 10^12`.
pub(crate) const SEED_LADDER_STEP: usize = 4;
