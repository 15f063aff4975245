//! Maximum packet amount discovery.
//!
//! The search keeps the largest amount known to reach the receiver and a
//! ceiling learned from `F08` rejects, then bisects the gap between them one
//! probe at a time: in log space while the ceiling is more than twice the
//! known-good amount, arithmetically afterwards. A ceiling computed from
//! `F08` metadata is authoritative and ends the search.

use sluice_primitives::Amount;
use sluice_probe::ProbeResult;
use tracing::trace;

use crate::constants::{SEED_LADDER_MAX_EXPONENT, SEED_LADDER_STEP};

/// Upper bound on the max packet amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceiling {
    /// No `F08` seen yet.
    Unknown,
    /// Inferred from an `F08` without metadata: `sent - 1`.
    Imprecise(Amount),
    /// Computed from `F08` metadata.
    Precise(Amount),
}

/// Discovered max packet amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPacket {
    pub amount: Amount,
    /// `amount` is proven to be the path maximum, not just a lower bound.
    pub exact: bool,
}

/// Single-writer state of the max packet search.
#[derive(Debug, Clone)]
pub struct MaxPacketDiscoverer {
    known_good: Amount,
    verified: bool,
    ceiling: Ceiling,
}

impl Default for MaxPacketDiscoverer {
    fn default() -> Self {
        Self::new()
    }
}

impl MaxPacketDiscoverer {
    pub fn new() -> Self {
        Self {
            known_good: Amount::ZERO,
            verified: false,
            ceiling: Ceiling::Unknown,
        }
    }

    /// `u64::MAX` plus `10^0, 10^4, 10^8, 10^12`.
    pub fn seed_amounts() -> Vec<Amount> {
        core::iter::once(Amount::MAX)
            .chain(
                (0..=SEED_LADDER_MAX_EXPONENT)
                    .step_by(SEED_LADDER_STEP)
                    .map(|exp| Amount::new(10u64.pow(exp))),
            )
            .collect()
    }

    pub fn known_good(&self) -> Amount {
        self.known_good
    }

    pub fn ceiling(&self) -> Ceiling {
        self.ceiling
    }

    /// Fold one probe result into the state. Zero-amount probes carry no
    /// information about packet size.
    pub fn observe(&mut self, result: &ProbeResult) {
        let sent = result.amount_sent;
        if sent.is_zero() {
            return;
        }

        if result.reached_receiver() {
            self.verified = true;
            self.known_good = self.known_good.max(sent);
        } else if let Some(hint) = result.max_amount_hint() {
            self.ceiling = match (self.ceiling, hint.exact) {
                (Ceiling::Precise(current), true) => Ceiling::Precise(current.min(hint.amount)),
                (_, true) => Ceiling::Precise(hint.amount),
                (Ceiling::Precise(current), false) => Ceiling::Precise(current),
                (Ceiling::Imprecise(current), false) => Ceiling::Imprecise(current.min(hint.amount)),
                (Ceiling::Unknown, false) => Ceiling::Imprecise(hint.amount),
            };
        }

        // A verified amount outranks an older imprecise bound below it.
        if let Ceiling::Imprecise(ceiling) = self.ceiling {
            if ceiling < self.known_good {
                self.ceiling = Ceiling::Imprecise(self.known_good);
            }
        }
        trace!(%sent, known_good = %self.known_good, ceiling = ?self.ceiling, "max packet state");
    }

    /// Whether further probing can improve the result.
    pub fn is_done(&self) -> bool {
        match self.ceiling {
            Ceiling::Precise(_) => true,
            Ceiling::Imprecise(ceiling) => self.known_good >= ceiling,
            Ceiling::Unknown => self.known_good == Amount::MAX,
        }
    }

    /// Whether anything was learned about the path.
    pub fn has_evidence(&self) -> bool {
        self.verified || self.ceiling != Ceiling::Unknown
    }

    /// Next amount to probe: the midpoint of `(known_good, ceiling]`, or the
    /// nearest amount `tried` does not report as sent.
    pub fn next_trial(&self, tried: impl Fn(Amount) -> bool) -> Option<Amount> {
        let lo = self.known_good.as_u64();
        let hi = match self.ceiling {
            Ceiling::Precise(_) => return None,
            Ceiling::Imprecise(ceiling) => ceiling.as_u64(),
            Ceiling::Unknown => u64::MAX,
        };
        if hi <= lo {
            return None;
        }

        let mid = if hi - lo > lo {
            geometric_midpoint(lo.max(1), hi)
        } else {
            arithmetic_midpoint(lo, hi)
        }
        .clamp(lo + 1, hi);

        (mid..=hi)
            .chain((lo + 1..mid).rev())
            .map(Amount::new)
            .find(|amount| !tried(*amount))
    }

    /// Best result so far. `None` when no probe produced evidence of a fit.
    pub fn result(&self) -> Option<MaxPacket> {
        match self.ceiling {
            Ceiling::Precise(amount) => Some(MaxPacket {
                amount,
                exact: true,
            }),
            _ if self.verified => Some(MaxPacket {
                amount: self.known_good,
                exact: self.is_done(),
            }),
            // Even one unit is too large.
            Ceiling::Imprecise(ceiling) if ceiling.is_zero() => Some(MaxPacket {
                amount: Amount::ZERO,
                exact: true,
            }),
            _ => None,
        }
    }
}

/// `sqrt(lo * hi)`, rounded.
fn geometric_midpoint(lo: u64, hi: u64) -> u64 {
    let point = (((lo as f64).ln() + (hi as f64).ln()) / 2.0).exp();
    // Saturating float to int cast.
    point.round() as u64
}

/// `lo + ceil((hi - lo) / 2)`.
fn arithmetic_midpoint(lo: u64, hi: u64) -> u64 {
    lo + (hi - lo).div_ceil(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_probe::{IlpErrorCode, ProbeReply};

    fn delivered(sent: u64) -> ProbeResult {
        ProbeResult::from_reply(Amount::new(sent), &ProbeReply::received(Amount::new(sent)))
    }

    fn too_large(sent: u64) -> ProbeResult {
        ProbeResult::from_reply(Amount::new(sent), &ProbeReply::rejected(IlpErrorCode::F08))
    }

    fn too_large_with(sent: u64, received: u64, maximum: u64) -> ProbeResult {
        ProbeResult::from_reply(
            Amount::new(sent),
            &ProbeReply::too_large(Amount::new(received), Amount::new(maximum)),
        )
    }

    #[test]
    fn test_seed_amounts() {
        let seed = MaxPacketDiscoverer::seed_amounts();
        assert_eq!(
            seed,
            [u64::MAX, 1, 10_000, 100_000_000, 1_000_000_000_000]
                .map(Amount::new)
                .to_vec()
        );
    }

    #[test]
    fn test_precise_metadata_is_authoritative() {
        let mut discoverer = MaxPacketDiscoverer::new();
        discoverer.observe(&too_large(1_000));
        discoverer.observe(&too_large_with(100_000, 100_000, 1_234));
        discoverer.observe(&too_large(500));
        assert_eq!(discoverer.ceiling(), Ceiling::Precise(Amount::new(1_234)));
        assert!(discoverer.is_done());
        assert_eq!(
            discoverer.result(),
            Some(MaxPacket {
                amount: Amount::new(1_234),
                exact: true
            })
        );

        // Lowest precise ceiling wins.
        discoverer.observe(&too_large_with(10_000, 10_000, 900));
        assert_eq!(discoverer.ceiling(), Ceiling::Precise(Amount::new(900)));
    }

    #[test]
    fn test_verified_amount_raises_stale_ceiling() {
        let mut discoverer = MaxPacketDiscoverer::new();
        discoverer.observe(&too_large(100));
        discoverer.observe(&delivered(150));
        assert_eq!(discoverer.ceiling(), Ceiling::Imprecise(Amount::new(150)));
        assert!(discoverer.is_done());
    }

    #[test]
    fn test_zero_amount_probes_are_ignored() {
        let mut discoverer = MaxPacketDiscoverer::new();
        discoverer.observe(&delivered(0));
        assert!(!discoverer.has_evidence());
        assert_eq!(discoverer.result(), None);
    }

    #[test]
    fn test_geometric_then_arithmetic_midpoint() {
        let mut discoverer = MaxPacketDiscoverer::new();
        discoverer.observe(&delivered(100_000));
        discoverer.observe(&too_large(1_000_000));
        assert_eq!(discoverer.next_trial(|_| false), Some(Amount::new(316_228)));

        discoverer.observe(&delivered(300_000));
        discoverer.observe(&too_large(300_011));
        assert_eq!(discoverer.next_trial(|_| false), Some(Amount::new(300_005)));
    }

    #[test]
    fn test_last_gap_probes_the_ceiling() {
        let mut discoverer = MaxPacketDiscoverer::new();
        discoverer.observe(&delivered(10));
        discoverer.observe(&too_large(12));
        assert_eq!(discoverer.next_trial(|_| false), Some(Amount::new(11)));

        discoverer.observe(&too_large(11));
        assert!(discoverer.is_done());
        assert_eq!(discoverer.next_trial(|_| false), None);
    }

    #[test]
    fn test_tried_midpoint_moves_to_nearest_untried() {
        let mut discoverer = MaxPacketDiscoverer::new();
        discoverer.observe(&delivered(10));
        discoverer.observe(&too_large(20));
        assert_eq!(discoverer.next_trial(|_| false), Some(Amount::new(15)));

        let tried = [15, 16].map(Amount::new);
        assert_eq!(discoverer.next_trial(|amount| tried.contains(&amount)), Some(Amount::new(17)));
        assert_eq!(
            discoverer.next_trial(|amount| amount != Amount::new(12)),
            Some(Amount::new(12))
        );
        assert_eq!(discoverer.next_trial(|_| true), None);
    }

    /// Runs the seed round and then bisects against a path capped at `cap`
    /// that rejects without metadata. Returns the result and probes sent.
    fn search(cap: u64) -> (MaxPacket, usize) {
        let send = |amount: Amount| {
            if amount.as_u64() <= cap {
                delivered(amount.as_u64())
            } else {
                too_large(amount.as_u64())
            }
        };
        let mut discoverer = MaxPacketDiscoverer::new();
        let mut probes = 0;
        for amount in MaxPacketDiscoverer::seed_amounts() {
            discoverer.observe(&send(amount));
            probes += 1;
        }
        while let Some(amount) = discoverer.next_trial(|_| false) {
            discoverer.observe(&send(amount));
            probes += 1;
        }
        (discoverer.result().unwrap(), probes)
    }

    #[test]
    fn test_bisection_converges_in_few_probes() {
        for cap in [300_324, 23_456_789, 98_765_431] {
            let (result, probes) = search(cap);
            assert_eq!(result, MaxPacket { amount: Amount::new(cap), exact: true });
            assert!(probes < 40, "cap {cap} used {probes} probes");
        }

        let (result, probes) = search(999_999_999_999);
        assert_eq!(result, MaxPacket { amount: Amount::new(999_999_999_999), exact: true });
        assert!(probes <= 50, "used {probes} probes");
    }

    #[test]
    fn test_one_unit_too_large() {
        let mut discoverer = MaxPacketDiscoverer::new();
        discoverer.observe(&too_large(1));
        discoverer.observe(&too_large(10));
        assert!(discoverer.is_done());
        assert_eq!(
            discoverer.result(),
            Some(MaxPacket {
                amount: Amount::ZERO,
                exact: true
            })
        );
    }

    #[test]
    fn test_unconstrained() {
        let mut discoverer = MaxPacketDiscoverer::new();
        for amount in MaxPacketDiscoverer::seed_amounts() {
            discoverer.observe(&delivered(amount.as_u64()));
        }
        assert!(discoverer.is_done());
        assert_eq!(
            discoverer.result(),
            Some(MaxPacket {
                amount: Amount::MAX,
                exact: true
            })
        );
    }
}
