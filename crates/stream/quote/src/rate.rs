//! Exchange rate probing and validation.

use core::fmt;

use sluice_primitives::{Amount, Ratio};
use sluice_probe::ProbeResult;
use tracing::debug;

use crate::PaymentError;

/// Fraction of the reference rate the sender is willing to lose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slippage(Ratio);

impl Slippage {
    /// Finite value in `[0, 1)`.
    pub fn new(value: f64) -> Result<Self, PaymentError> {
        if !value.is_finite() || !(0.0..1.0).contains(&value) {
            return Err(PaymentError::InvalidSlippage(format!(
                "{value} is not a number in [0, 1)"
            )));
        }
        Ratio::from_f64(value)
            .map(Self)
            .map_err(|err| PaymentError::InvalidSlippage(err.to_string()))
    }

    pub fn as_ratio(&self) -> &Ratio {
        &self.0
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Bounds on the path rate implied by integer delivery.
///
/// A probe of `sent` that delivered `d` means the true rate lies in
/// `[d / sent, (d + 1) / sent)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedRate {
    pub lower: Ratio,
    pub upper: Ratio,
}

/// Keeps the tightest rate bound seen, from the largest delivered probe.
#[derive(Debug, Clone, Default)]
pub struct RateProbe {
    best: Option<(Amount, Amount)>,
}

impl RateProbe {
    pub fn observe(&mut self, result: &ProbeResult) {
        let Some(delivered) = result.delivered() else {
            return;
        };
        let sent = result.amount_sent;
        if sent.is_zero() {
            return;
        }
        if self.best.is_none_or(|(best_sent, _)| sent > best_sent) {
            self.best = Some((sent, delivered));
        }
    }

    /// Largest source amount with a known delivered amount.
    pub fn largest_sent(&self) -> Option<Amount> {
        self.best.map(|(sent, _)| sent)
    }

    pub fn rate(&self) -> Option<ProbedRate> {
        let (sent, delivered) = self.best?;
        let lower = Ratio::new(delivered.as_u64(), sent.as_u64()).ok()?;
        let upper = Ratio::new(delivered.to_biguint() + 1u32, sent.to_biguint()).ok()?;
        Some(ProbedRate { lower, upper })
    }
}

/// Decides whether a path rate can honour the minimum exchange rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateValidator;

impl RateValidator {
    /// `reference * (1 - slippage)`.
    pub fn min_exchange_rate(&self, reference: &Ratio, slippage: &Slippage) -> Ratio {
        // Slippage is below one, so the complement exists.
        let retained = slippage.as_ratio().complement().unwrap_or_else(Ratio::zero);
        reference * &retained
    }

    /// Reject when the probed rate is below the minimum, or when a packet of
    /// `max_packet` cannot deliver the minimum once delivery is floored.
    pub fn validate(
        &self,
        probed: &ProbedRate,
        min_rate: &Ratio,
        max_packet: Amount,
    ) -> Result<(), PaymentError> {
        if min_rate.is_zero() {
            return Err(PaymentError::InsufficientExchangeRate(
                "minimum exchange rate is zero".to_string(),
            ));
        }
        if probed.lower < *min_rate {
            return Err(PaymentError::InsufficientExchangeRate(format!(
                "probed rate {} is below minimum {}",
                probed.lower, min_rate
            )));
        }

        let deliverable = probed.lower.floor_mul(max_packet);
        let required = min_rate.ceil_mul(max_packet);
        debug!(%max_packet, %deliverable, %required, "per-packet rounding check");
        if deliverable < required {
            return Err(PaymentError::InsufficientExchangeRate(format!(
                "a packet of {max_packet} delivers {deliverable}, minimum requires {required}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sluice_probe::ProbeReply;

    fn ratio(n: u64, d: u64) -> Ratio {
        Ratio::new(n, d).unwrap()
    }

    fn delivered(sent: u64, delivered: u64) -> ProbeResult {
        ProbeResult::from_reply(Amount::new(sent), &ProbeReply::received(Amount::new(delivered)))
    }

    #[test]
    fn test_slippage_bounds() {
        assert!(Slippage::new(0.0).is_ok());
        assert!(Slippage::new(0.999).is_ok());
        for bad in [1.0, -0.01, f64::NAN, f64::INFINITY] {
            assert_matches!(Slippage::new(bad), Err(PaymentError::InvalidSlippage(_)));
        }
    }

    #[test]
    fn test_largest_delivered_probe_wins() {
        let mut probe = RateProbe::default();
        probe.observe(&delivered(1_000, 999));
        probe.observe(&delivered(10, 9));
        probe.observe(&delivered(0, 0));

        let rate = probe.rate().unwrap();
        assert_eq!(rate.lower, ratio(999, 1_000));
        assert_eq!(rate.upper, ratio(1_000, 1_000));
        assert_eq!(probe.largest_sent(), Some(Amount::new(1_000)));
    }

    #[test]
    fn test_min_rate_applies_slippage() {
        let min = RateValidator.min_exchange_rate(&ratio(2, 1), &Slippage::new(0.01).unwrap());
        assert_eq!(min, ratio(198, 100));
    }

    #[test]
    fn test_rounding_margin() {
        let validator = RateValidator;
        let min = validator.min_exchange_rate(&Ratio::one(), &Slippage::new(0.0005001).unwrap());

        // Real rate 0.9995, but a 1000 unit packet only shows 999/1000.
        let small = ProbedRate {
            lower: ratio(999, 1_000),
            upper: ratio(1_000, 1_000),
        };
        assert_matches!(
            validator.validate(&small, &min, Amount::new(1_000)),
            Err(PaymentError::InsufficientExchangeRate(_))
        );

        // Larger packets resolve the rate well enough.
        let large = ProbedRate {
            lower: ratio(99_950, 100_000),
            upper: ratio(99_951, 100_000),
        };
        assert!(validator.validate(&large, &min, Amount::new(100_000)).is_ok());
    }

    #[test]
    fn test_rounding_check_alone_can_reject() {
        // Probed rate is above the minimum, yet floor(3 * 0.5) = 1 < ceil(3 * 0.4) = 2.
        let probed = ProbedRate {
            lower: ratio(1, 2),
            upper: ratio(2, 3),
        };
        assert_matches!(
            RateValidator.validate(&probed, &ratio(2, 5), Amount::new(3)),
            Err(PaymentError::InsufficientExchangeRate(_))
        );
    }

    #[test]
    fn test_zero_min_rate_rejected() {
        let probed = ProbedRate {
            lower: Ratio::zero(),
            upper: ratio(1, 10),
        };
        assert_matches!(
            RateValidator.validate(&probed, &Ratio::zero(), Amount::new(10)),
            Err(PaymentError::InsufficientExchangeRate(_))
        );
    }
}
