use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_primitives::{Amount, Asset, Ratio};
use sluice_probe::{Frame, IlpErrorCode, ProbeChannel, ProbeError, ProbeReply};
use tracing::trace;

/// Simulated ILP path to a STREAM receiver.
///
/// Packets above the cap are rejected `F08` by the first hop, so `received`
/// in the metadata equals the source amount. Delivered amounts are
/// `floor(amount * rate)`; one that would not fit a `u64` is also rejected
/// `F08`, without metadata.
#[derive(Debug)]
pub struct SimulatedPath {
    rate: Ratio,
    max_packet: Option<Amount>,
    metadata: bool,
    asset: Option<Asset>,
    asset_above: Option<(Amount, Asset)>,
    unreachable: bool,
    temporary_failures: u32,
    close_above: Option<Amount>,
    failures: Mutex<HashMap<Amount, u32>>,
    sent: Mutex<Vec<Amount>>,
    closes: AtomicUsize,
}

impl SimulatedPath {
    pub fn builder() -> SimulatedPathBuilder {
        SimulatedPathBuilder::default()
    }

    /// Probe attempts received, retries included.
    pub fn probes_sent(&self) -> usize {
        self.sent.lock().len()
    }

    /// Amounts in arrival order.
    pub fn sent_amounts(&self) -> Vec<Amount> {
        self.sent.lock().clone()
    }

    /// Times [`ProbeChannel::close`] was called.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }

    fn declared_asset(&self, amount: Amount) -> Option<&Asset> {
        match &self.asset_above {
            Some((threshold, asset)) if amount > *threshold => Some(asset),
            _ => self.asset.as_ref(),
        }
    }

    fn reply(&self, amount: Amount) -> Result<ProbeReply, ProbeError> {
        if self.unreachable {
            return Err(ProbeError::Unreachable("simulated path is down".to_string()));
        }

        if self.temporary_failures > 0 {
            let mut failures = self.failures.lock();
            let seen = failures.entry(amount).or_default();
            if *seen < self.temporary_failures {
                *seen += 1;
                return Ok(ProbeReply::rejected(IlpErrorCode::T04));
            }
        }

        if let Some(cap) = self.max_packet.filter(|cap| amount > *cap) {
            return Ok(if self.metadata {
                ProbeReply::too_large(amount, cap)
            } else {
                ProbeReply::rejected(IlpErrorCode::F08)
            });
        }

        let Ok(delivered) = Amount::try_from_biguint(&self.rate.floor_mul(amount)) else {
            return Ok(ProbeReply::rejected(IlpErrorCode::F08));
        };
        let mut reply = ProbeReply::received(delivered);
        if let Some(asset) = self.declared_asset(amount) {
            reply = reply.with_asset(asset.clone());
        }
        if self.close_above.is_some_and(|threshold| amount > threshold) {
            reply = reply.with_frame(Frame::ConnectionClose {
                code: 1,
                message: "receiver closed".to_string(),
            });
        }
        Ok(reply)
    }
}

#[async_trait]
impl ProbeChannel for SimulatedPath {
    async fn send_probe(&self, amount: Amount) -> Result<ProbeReply, ProbeError> {
        self.sent.lock().push(amount);
        let reply = self.reply(amount);
        trace!(%amount, ?reply, "simulated probe");
        reply
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Builder for [`SimulatedPath`]. Defaults to a 1:1, uncapped path whose
/// receiver declares no asset.
#[derive(Debug, Default)]
pub struct SimulatedPathBuilder {
    rate: Option<Ratio>,
    max_packet: Option<Amount>,
    metadata: bool,
    asset: Option<Asset>,
    asset_above: Option<(Amount, Asset)>,
    unreachable: bool,
    temporary_failures: u32,
    close_above: Option<Amount>,
}

impl SimulatedPathBuilder {
    /// Destination units delivered per source unit.
    pub fn rate(mut self, rate: Ratio) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Reject packets above `cap` with `F08`, with or without metadata.
    pub fn max_packet(mut self, cap: Amount, metadata: bool) -> Self {
        self.max_packet = Some(cap);
        self.metadata = metadata;
        self
    }

    /// Asset the receiver declares in every reply.
    pub fn asset(mut self, asset: Asset) -> Self {
        self.asset = Some(asset);
        self
    }

    /// Declare `asset` instead for probes above `threshold`.
    pub fn asset_above(mut self, threshold: Amount, asset: Asset) -> Self {
        self.asset_above = Some((threshold, asset));
        self
    }

    /// Fail every probe at the transport.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Reject the first `count` attempts of each amount with `T04`.
    pub fn temporary_failures(mut self, count: u32) -> Self {
        self.temporary_failures = count;
        self
    }

    /// Attach a `ConnectionClose` frame to replies above `threshold`.
    pub fn close_above(mut self, threshold: Amount) -> Self {
        self.close_above = Some(threshold);
        self
    }

    pub fn build(self) -> SimulatedPath {
        SimulatedPath {
            rate: self.rate.unwrap_or_else(Ratio::one),
            max_packet: self.max_packet,
            metadata: self.metadata,
            asset: self.asset,
            asset_above: self.asset_above,
            unreachable: self.unreachable,
            temporary_failures: self.temporary_failures,
            close_above: self.close_above,
            failures: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        }
    }
}
