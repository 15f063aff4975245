//! Quote inputs and results.

use sluice_pricing::PriceTable;
use sluice_primitives::{Amount, AmountInput, Asset, AssetInput, Ratio};
use tracing::debug;

use crate::{Destination, PaymentError, ProbedRate, Slippage};

/// Which side of the payment is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PaymentType {
    /// Send exactly the source amount.
    FixedSend,
    /// Deliver exactly the destination amount.
    FixedDelivery,
}

/// Caller options for a quote. Amounts are loosely typed and validated
/// before any probe is sent.
#[derive(Debug, Clone, Default)]
pub struct QuoteOptions {
    pub source_asset: Option<AssetInput>,
    pub amount_to_send: Option<AmountInput>,
    pub amount_to_deliver: Option<AmountInput>,
    /// Falls back to the configured default.
    pub slippage: Option<f64>,
    /// Reference prices; overrides an injected price oracle.
    pub prices: Option<PriceTable>,
}

impl QuoteOptions {
    pub fn new(source_asset: impl Into<AssetInput>) -> Self {
        Self {
            source_asset: Some(source_asset.into()),
            ..Default::default()
        }
    }

    pub fn send(mut self, amount: impl Into<AmountInput>) -> Self {
        self.amount_to_send = Some(amount.into());
        self
    }

    pub fn deliver(mut self, amount: impl Into<AmountInput>) -> Self {
        self.amount_to_deliver = Some(amount.into());
        self
    }

    pub fn with_slippage(mut self, slippage: f64) -> Self {
        self.slippage = Some(slippage);
        self
    }

    pub fn with_prices(mut self, prices: PriceTable) -> Self {
        self.prices = Some(prices);
        self
    }
}

/// Fixed side of a validated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Send(Amount),
    Deliver(Amount),
}

/// Quote options after validation.
#[derive(Debug, Clone)]
pub(crate) struct QuoteRequest {
    pub(crate) source_asset: Asset,
    pub(crate) target: Target,
    pub(crate) slippage: Slippage,
    pub(crate) prices: Option<PriceTable>,
}

impl QuoteOptions {
    pub(crate) fn validate(
        self,
        destination: &Destination,
        default_slippage: f64,
    ) -> Result<QuoteRequest, PaymentError> {
        let source_asset = self
            .source_asset
            .as_ref()
            .ok_or_else(|| PaymentError::UnknownSourceAsset("no source asset".to_string()))?
            .resolve()
            .map_err(|err| PaymentError::UnknownSourceAsset(err.to_string()))?;

        let slippage = Slippage::new(self.slippage.unwrap_or(default_slippage))?;

        let target = match destination.invoice() {
            Some(invoice) => {
                let remaining = invoice.remaining().ok_or_else(|| {
                    PaymentError::InvoiceAlreadyPaid(format!(
                        "{} of {} delivered",
                        invoice.amount_delivered, invoice.amount_to_deliver
                    ))
                })?;
                if self.amount_to_send.is_some() || self.amount_to_deliver.is_some() {
                    debug!(%remaining, "invoice overrides caller amounts");
                }
                Target::Deliver(remaining)
            }
            None => {
                let send = self
                    .amount_to_send
                    .as_ref()
                    .map(|input| positive(input, PaymentError::InvalidSourceAmount))
                    .transpose()?;
                let deliver = self
                    .amount_to_deliver
                    .as_ref()
                    .map(|input| positive(input, PaymentError::InvalidDestinationAmount))
                    .transpose()?;
                match (send, deliver) {
                    (Some(send), None) => Target::Send(send),
                    (None, Some(deliver)) => Target::Deliver(deliver),
                    (Some(_), Some(_)) => {
                        return Err(PaymentError::UnknownPaymentTarget(
                            "both an amount to send and an amount to deliver".to_string(),
                        ));
                    }
                    (None, None) => {
                        return Err(PaymentError::UnknownPaymentTarget(
                            "no amount to send, amount to deliver or invoice".to_string(),
                        ));
                    }
                }
            }
        };

        Ok(QuoteRequest {
            source_asset,
            target,
            slippage,
            prices: self.prices,
        })
    }
}

fn positive(
    input: &AmountInput,
    error: impl FnOnce(String) -> PaymentError,
) -> Result<Amount, PaymentError> {
    match input.parse() {
        Ok(amount) if amount.is_positive() => Ok(amount),
        Ok(_) => Err(error("amount must be positive".to_string())),
        Err(err) => Err(error(err.to_string())),
    }
}

/// Terms under which a payment is safe to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub payment_type: PaymentType,
    pub source_asset: Asset,
    pub destination_asset: Asset,
    /// Largest packet the path carries, in source units.
    pub max_packet_amount: Amount,
    /// `max_packet_amount` is the path maximum rather than a lower bound.
    pub max_packet_exact: bool,
    /// Destination units per source unit every packet must achieve.
    pub min_exchange_rate: Ratio,
    pub probed_rate: ProbedRate,
    /// Least the receiver gets if every packet meets the minimum rate.
    pub min_delivery_amount: Amount,
    /// Most the sender spends.
    pub max_source_amount: Amount,
    pub estimated_packets: u64,
}
