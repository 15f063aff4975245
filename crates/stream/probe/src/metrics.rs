//! Probe metrics.

use metrics::Counter;

use crate::ProbeOutcome;

/// Probe counters.
#[derive(Clone, Debug)]
pub(crate) struct ProbeMetrics {
    /// Probe attempts, including retries.
    sent_total: Counter,
    /// Probe attempts that were retried.
    retried_total: Counter,
}

impl Default for ProbeMetrics {
    fn default() -> Self {
        Self {
            sent_total: metrics::counter!("probe.sent_total"),
            retried_total: metrics::counter!("probe.retried_total"),
        }
    }
}

impl ProbeMetrics {
    pub(crate) fn inc_sent(&self) {
        self.sent_total.increment(1);
    }

    pub(crate) fn inc_retried(&self) {
        self.retried_total.increment(1);
    }

    /// Final outcome of a probe, labelled by kind.
    pub(crate) fn record_outcome(&self, outcome: &ProbeOutcome) {
        metrics::counter!("probe.outcome_total", "outcome" => outcome.kind()).increment(1);
    }
}
