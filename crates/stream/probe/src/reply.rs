//! Probe replies and their classification.

use sluice_primitives::{Amount, Asset, Ratio, Rounding};

use crate::{Frame, IlpErrorCode};

/// `F08` metadata: the amount the rejecting hop received and its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxAmountMetadata {
    /// Amount that arrived at the rejecting hop.
    pub received: Amount,
    /// Largest amount that hop accepts.
    pub maximum: Amount,
}

/// Reject details.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectInfo {
    /// ILP error code.
    pub code: IlpErrorCode,
    /// Present on `F08` rejects that carry amount metadata.
    pub max_amount: Option<MaxAmountMetadata>,
}

/// Raw reply to a single probe, as reported by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReply {
    /// Packet was fulfilled.
    pub fulfilled: bool,
    /// Amount the receiver reports as having arrived.
    pub delivered: Option<Amount>,
    /// STREAM frames in the reply.
    pub frames: Vec<Frame>,
    /// Reject details, absent when fulfilled.
    pub reject: Option<RejectInfo>,
}

impl ProbeReply {
    /// A fulfilled packet.
    pub fn fulfilled(delivered: Amount) -> Self {
        Self {
            fulfilled: true,
            delivered: Some(delivered),
            frames: Vec::new(),
            reject: None,
        }
    }

    /// A reject with the given code.
    pub fn rejected(code: IlpErrorCode) -> Self {
        Self {
            fulfilled: false,
            delivered: None,
            frames: Vec::new(),
            reject: Some(RejectInfo {
                code,
                max_amount: None,
            }),
        }
    }

    /// Receiver reject (`F99`) carrying the amount that arrived.
    pub fn received(delivered: Amount) -> Self {
        Self::rejected(IlpErrorCode::F99).with_delivered(delivered)
    }

    /// `F08` with metadata.
    pub fn too_large(received: Amount, maximum: Amount) -> Self {
        Self {
            reject: Some(RejectInfo {
                code: IlpErrorCode::F08,
                max_amount: Some(MaxAmountMetadata { received, maximum }),
            }),
            ..Self::rejected(IlpErrorCode::F08)
        }
    }

    pub fn with_delivered(mut self, delivered: Amount) -> Self {
        self.delivered = Some(delivered);
        self
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Shorthand for an [`Frame::AssetDetails`] frame.
    pub fn with_asset(self, asset: Asset) -> Self {
        self.with_frame(Frame::AssetDetails(asset))
    }

    /// Classify the reply.
    pub fn outcome(&self) -> ProbeOutcome {
        if self.fulfilled {
            return ProbeOutcome::Delivered(self.delivered);
        }
        let Some(reject) = &self.reject else {
            return ProbeOutcome::Failed(None);
        };
        // The receiver reports what arrived regardless of its reject code.
        if let Some(delivered) = self.delivered {
            return ProbeOutcome::Delivered(Some(delivered));
        }
        match reject.code {
            IlpErrorCode::F08 => ProbeOutcome::TooLarge(reject.max_amount),
            code if code.is_retryable() => ProbeOutcome::Temporary(code),
            code => ProbeOutcome::Failed(Some(code)),
        }
    }
}

/// What a probe proved about the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ProbeOutcome {
    /// Packet reached the receiver. Carries the delivered amount when known.
    Delivered(Option<Amount>),
    /// Rejected `F08` somewhere on the path.
    TooLarge(Option<MaxAmountMetadata>),
    /// Temporary or relative failure, including per-probe timeouts.
    Temporary(IlpErrorCode),
    /// Final failure, or the transport could not deliver the probe.
    Failed(Option<IlpErrorCode>),
}

impl ProbeOutcome {
    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

/// Upper bound on packet size learned from an `F08`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxAmountHint {
    /// Computed from metadata rather than inferred from the probe amount.
    pub exact: bool,
    /// Largest amount believed to fit, in source units.
    pub amount: Amount,
}

/// Result of one probe after retries.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// Source amount of the probe.
    pub amount_sent: Amount,
    /// Final classification.
    pub outcome: ProbeOutcome,
    /// Whether the final attempt was fulfilled.
    pub fulfilled: bool,
    /// Reject code of the final attempt.
    pub reject_code: Option<IlpErrorCode>,
    /// Assets declared in the reply frames.
    pub asset_declarations: Vec<Asset>,
    /// Receiver sent a `ConnectionClose` frame.
    pub closed_by_receiver: bool,
    /// The path answered, as opposed to a timeout or transport error.
    pub replied: bool,
    /// Number of attempts made, including retries.
    pub attempts: u32,
}

impl ProbeResult {
    /// Build from a transport reply.
    pub fn from_reply(amount_sent: Amount, reply: &ProbeReply) -> Self {
        let mut asset_declarations = Vec::new();
        let mut closed_by_receiver = false;
        for frame in &reply.frames {
            match frame {
                Frame::AssetDetails(asset) => asset_declarations.push(asset.clone()),
                Frame::ConnectionClose { .. } => closed_by_receiver = true,
                Frame::Other => {}
            }
        }
        Self {
            amount_sent,
            outcome: reply.outcome(),
            fulfilled: reply.fulfilled,
            reject_code: reply.reject.as_ref().map(|reject| reject.code),
            asset_declarations,
            closed_by_receiver,
            replied: true,
            attempts: 1,
        }
    }

    /// Result for a probe with no reply at all.
    pub fn without_reply(amount_sent: Amount, outcome: ProbeOutcome) -> Self {
        let reject_code = match outcome {
            ProbeOutcome::Temporary(code) => Some(code),
            ProbeOutcome::Failed(code) => code,
            _ => None,
        };
        Self {
            amount_sent,
            outcome,
            fulfilled: false,
            reject_code,
            asset_declarations: Vec::new(),
            closed_by_receiver: false,
            replied: false,
            attempts: 1,
        }
    }

    /// Amount reported as delivered, if any.
    pub fn delivered(&self) -> Option<Amount> {
        match self.outcome {
            ProbeOutcome::Delivered(delivered) => delivered,
            _ => None,
        }
    }

    /// Whether the packet is known to fit the path.
    pub fn reached_receiver(&self) -> bool {
        self.outcome.is_delivered()
    }

    /// Packet-size bound implied by an `F08`.
    ///
    /// With metadata the bound is `floor(sent * maximum / received)`, scaling
    /// the rejecting hop's limit back into source units. A zero `received`
    /// takes `maximum` as-is. Without metadata only `sent - 1` is known.
    pub fn max_amount_hint(&self) -> Option<MaxAmountHint> {
        let ProbeOutcome::TooLarge(metadata) = self.outcome else {
            return None;
        };
        let Some(metadata) = metadata else {
            return Some(MaxAmountHint {
                exact: false,
                amount: self.amount_sent.saturating_sub(Amount::ONE),
            });
        };
        let amount = if metadata.received.is_zero() {
            metadata.maximum
        } else {
            // Exceeds u64 only if the hop's maximum exceeds what it received,
            // which contradicts the reject; fall back to the probe amount.
            self.amount_sent
                .multiply_ratio(
                    &metadata.maximum.to_biguint(),
                    &metadata.received.to_biguint(),
                    Rounding::Floor,
                )
                .unwrap_or(self.amount_sent)
        };
        Some(MaxAmountHint {
            exact: true,
            amount,
        })
    }

    /// Exchange rate observed by this probe, `delivered / sent`.
    pub fn observed_rate(&self) -> Option<Ratio> {
        let delivered = self.delivered()?;
        Ratio::from_amounts(delivered, self.amount_sent).ok()
    }
}
