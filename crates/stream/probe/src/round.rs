//! Probe rounds.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use sluice_primitives::Amount;
use tracing::{debug, trace, warn};

use crate::metrics::ProbeMetrics;
use crate::{IlpErrorCode, ProbeChannel, ProbeError, ProbeOutcome, ProbeResult};

/// How a round of probes is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    /// Probes in flight at once.
    pub parallelism: usize,
    /// Deadline for a single attempt.
    pub probe_timeout: Duration,
    /// Extra attempts for temporary failures.
    pub max_retries: u32,
}

impl ProbePolicy {
    /// At least one probe is always in flight.
    pub fn concurrency(&self) -> usize {
        self.parallelism.max(1)
    }
}

/// Sends probe rounds over a channel for one quoting session.
///
/// An amount is sent at most once per session; later rounds silently drop
/// amounts already tried. Results come back by value and carry everything the
/// caller needs, so no state is shared between in-flight probes.
pub struct Prober<'a, C: ?Sized> {
    channel: &'a C,
    policy: ProbePolicy,
    tried: HashSet<Amount>,
    probes_sent: u64,
    rounds: u32,
    metrics: ProbeMetrics,
}

impl<'a, C: ProbeChannel + ?Sized> Prober<'a, C> {
    pub fn new(channel: &'a C, policy: ProbePolicy) -> Self {
        Self {
            channel,
            policy,
            tried: HashSet::new(),
            probes_sent: 0,
            rounds: 0,
            metrics: ProbeMetrics::default(),
        }
    }

    /// Send every untried amount in `amounts` and wait for all results.
    ///
    /// Results are in completion order.
    pub async fn round(&mut self, amounts: impl IntoIterator<Item = Amount>) -> Vec<ProbeResult> {
        let fresh: Vec<Amount> = amounts
            .into_iter()
            .filter(|amount| self.tried.insert(*amount))
            .collect();
        if fresh.is_empty() {
            return Vec::new();
        }

        self.rounds += 1;
        debug!(round = self.rounds, probes = fresh.len(), "sending probe round");

        let channel = self.channel;
        let policy = self.policy;
        let metrics = &self.metrics;
        let results: Vec<ProbeResult> = stream::iter(fresh)
            .map(|amount| send_with_retries(channel, policy, metrics, amount))
            .buffer_unordered(policy.concurrency())
            .collect()
            .await;

        self.probes_sent += results.iter().map(|result| u64::from(result.attempts)).sum::<u64>();
        results
    }

    /// Whether `amount` was already sent this session.
    pub fn was_tried(&self, amount: Amount) -> bool {
        self.tried.contains(&amount)
    }

    /// Probe attempts so far, including retries.
    pub fn probes_sent(&self) -> u64 {
        self.probes_sent
    }

    /// Rounds that sent at least one probe.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Policy applied to every round.
    pub fn policy(&self) -> &ProbePolicy {
        &self.policy
    }
}

async fn send_with_retries<C: ProbeChannel + ?Sized>(
    channel: &C,
    policy: ProbePolicy,
    metrics: &ProbeMetrics,
    amount: Amount,
) -> ProbeResult {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        metrics.inc_sent();

        let mut result = match tokio::time::timeout(policy.probe_timeout, channel.send_probe(amount)).await {
            Ok(Ok(reply)) => ProbeResult::from_reply(amount, &reply),
            Ok(Err(err)) => {
                debug!(%amount, %err, "probe transport error");
                let outcome = match err {
                    ProbeError::Timeout => ProbeOutcome::Temporary(IlpErrorCode::R00),
                    _ => ProbeOutcome::Failed(None),
                };
                ProbeResult::without_reply(amount, outcome)
            }
            Err(_) => {
                debug!(%amount, timeout = ?policy.probe_timeout, "probe timed out");
                ProbeResult::without_reply(amount, ProbeOutcome::Temporary(IlpErrorCode::R00))
            }
        };
        result.attempts = attempts;
        trace!(%amount, outcome = result.outcome.kind(), attempts, "probe reply");

        if result.outcome.is_temporary() {
            if attempts <= policy.max_retries {
                metrics.inc_retried();
                continue;
            }
            warn!(%amount, attempts, code = ?result.reject_code, "probe retries exhausted");
        }

        metrics.record_outcome(&result.outcome);
        return result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProbeReply;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Delivers everything at 1:1, except amounts listed as temporary which
    /// fail with `T04` that many times first.
    #[derive(Default)]
    struct FlakyChannel {
        sent: Mutex<Vec<Amount>>,
        temporary_failures: Mutex<Vec<(Amount, u32)>>,
    }

    #[async_trait]
    impl ProbeChannel for FlakyChannel {
        async fn send_probe(&self, amount: Amount) -> Result<ProbeReply, ProbeError> {
            self.sent.lock().push(amount);
            let mut failures = self.temporary_failures.lock();
            if let Some((_, remaining)) = failures.iter_mut().find(|(a, n)| *a == amount && *n > 0) {
                *remaining -= 1;
                return Ok(ProbeReply::rejected(IlpErrorCode::T04));
            }
            Ok(ProbeReply::received(amount))
        }
    }

    struct SilentChannel;

    #[async_trait]
    impl ProbeChannel for SilentChannel {
        async fn send_probe(&self, _amount: Amount) -> Result<ProbeReply, ProbeError> {
            std::future::pending().await
        }
    }

    struct UnreachableChannel;

    #[async_trait]
    impl ProbeChannel for UnreachableChannel {
        async fn send_probe(&self, _amount: Amount) -> Result<ProbeReply, ProbeError> {
            Err(ProbeError::Unreachable("no route".into()))
        }
    }

    fn policy() -> ProbePolicy {
        ProbePolicy {
            parallelism: 4,
            probe_timeout: Duration::from_secs(5),
            max_retries: 2,
        }
    }

    fn amounts(values: &[u64]) -> Vec<Amount> {
        values.iter().copied().map(Amount::new).collect()
    }

    #[tokio::test]
    async fn test_amounts_are_never_resent() {
        let channel = FlakyChannel::default();
        let mut prober = Prober::new(&channel, policy());

        let first = prober.round(amounts(&[1, 10, 10, 100])).await;
        assert_eq!(first.len(), 3);

        let second = prober.round(amounts(&[10, 100, 1000])).await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].amount_sent, Amount::new(1000));

        assert!(prober.round(amounts(&[1, 1000])).await.is_empty());
        assert_eq!(prober.probes_sent(), 4);
        assert_eq!(prober.rounds(), 2);
        assert_eq!(channel.sent.lock().len(), 4);
        assert!(prober.was_tried(Amount::new(10)));
        assert!(!prober.was_tried(Amount::new(11)));
    }

    #[tokio::test]
    async fn test_temporary_failures_are_retried() {
        let channel = FlakyChannel::default();
        channel.temporary_failures.lock().push((Amount::new(7), 2));
        let mut prober = Prober::new(&channel, policy());

        let results = prober.round(amounts(&[7])).await;
        assert_eq!(results[0].outcome, ProbeOutcome::Delivered(Some(Amount::new(7))));
        assert_eq!(results[0].attempts, 3);
        assert_eq!(prober.probes_sent(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let channel = FlakyChannel::default();
        channel.temporary_failures.lock().push((Amount::new(7), 10));
        let mut prober = Prober::new(&channel, policy());

        let results = prober.round(amounts(&[7])).await;
        assert_eq!(results[0].outcome, ProbeOutcome::Temporary(IlpErrorCode::T04));
        assert_eq!(results[0].attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_is_temporary() {
        let mut prober = Prober::new(
            &SilentChannel,
            ProbePolicy {
                max_retries: 1,
                ..policy()
            },
        );

        let results = prober.round(amounts(&[5])).await;
        assert_eq!(results[0].outcome, ProbeOutcome::Temporary(IlpErrorCode::R00));
        assert_eq!(results[0].reject_code, Some(IlpErrorCode::R00));
        assert_eq!(results[0].attempts, 2);
    }

    #[tokio::test]
    async fn test_transport_errors_become_failures() {
        let mut prober = Prober::new(&UnreachableChannel, policy());
        let results = prober.round(amounts(&[1, 2])).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.outcome == ProbeOutcome::Failed(None)));
        assert!(results.iter().all(|r| !r.replied));
    }
}
