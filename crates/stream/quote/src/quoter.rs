//! Quote orchestration.

use std::sync::Arc;

use sluice_pricing::{PriceOracle, reference_rate};
use sluice_primitives::{Asset, Ratio, Rounding};
use sluice_probe::{ProbeChannel, ProbeResult, Prober};
use tracing::{debug, info, instrument, warn};

use crate::quote::{QuoteRequest, Target};
use crate::{
    AssetResolver, Destination, MaxPacket, MaxPacketDiscoverer, PaymentError, PaymentType,
    ProbedRate, Quote, QuoteConfig, QuoteOptions, RateProbe, RateValidator,
};

/// Runs quoting sessions against a destination.
///
/// Each call to [`Quoter::quote`] is an independent session: probes, the
/// asset binding learned from replies, and search state are discarded when it
/// returns.
pub struct Quoter<Cfg> {
    config: Cfg,
    oracle: Option<Arc<dyn PriceOracle>>,
}

impl<Cfg: QuoteConfig> Quoter<Cfg> {
    pub fn new(config: Cfg) -> Self {
        Self {
            config,
            oracle: None,
        }
    }

    /// Use `oracle` for reference rates when a quote supplies no prices.
    pub fn with_oracle(mut self, oracle: Arc<dyn PriceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn config(&self) -> &Cfg {
        &self.config
    }

    /// Quote a payment to `destination` over `channel`.
    ///
    /// Input is validated before any probe is sent. The session is bounded by
    /// the configured session timeout.
    #[instrument(skip_all, fields(destination = %destination.address()))]
    pub async fn quote<C: ProbeChannel + ?Sized>(
        &self,
        channel: &C,
        destination: &Destination,
        options: QuoteOptions,
    ) -> Result<Quote, PaymentError> {
        let result = match options.validate(destination, self.config.default_slippage()) {
            Ok(request) => {
                debug!(source_asset = %request.source_asset, target = ?request.target, "validated quote input");
                let timeout = self.config.session_timeout();
                tokio::time::timeout(timeout, self.run(channel, destination, request))
                    .await
                    .unwrap_or_else(|_| {
                        Err(PaymentError::RateProbeFailed(format!(
                            "quoting did not finish within {timeout:?}"
                        )))
                    })
            }
            Err(err) => Err(err),
        };

        let label = match &result {
            Ok(_) => "ok",
            Err(err) => err.code(),
        };
        metrics::counter!("quote.total", "result" => label).increment(1);
        if let Err(err) = &result {
            debug!(code = err.code(), %err, "quote failed");
        }
        result
    }

    async fn run<C: ProbeChannel + ?Sized>(
        &self,
        channel: &C,
        destination: &Destination,
        request: QuoteRequest,
    ) -> Result<Quote, PaymentError> {
        let mut prober = Prober::new(channel, self.config.probe_policy());

        let mut assets = AssetResolver::new(destination.asset_binding().clone());
        let destination_asset = assets
            .resolve(&mut prober, self.config.asset_probe_amounts())
            .await?;
        debug!(%destination_asset, binding = ?assets.binding(), "destination asset resolved");

        let reference = self.reference_rate(&request, &destination_asset)?;

        let (max_packet, probed) = self.discover(&mut prober, &mut assets).await?;
        debug!(
            max_packet = %max_packet.amount,
            exact = max_packet.exact,
            lower = %probed.lower,
            upper = %probed.upper,
            probes = prober.probes_sent(),
            rounds = prober.rounds(),
            "path probed"
        );

        let validator = RateValidator;
        let min_rate = validator.min_exchange_rate(reference.as_ref().unwrap_or(&probed.lower), &request.slippage);
        validator.validate(&probed, &min_rate, max_packet.amount)?;

        let (payment_type, max_source_amount, min_delivery_amount) = match request.target {
            Target::Send(send) => {
                let min_delivery = send
                    .multiply_ratio(min_rate.numerator(), min_rate.denominator(), Rounding::Floor)
                    .map_err(|err| PaymentError::InvalidSourceAmount(err.to_string()))?;
                if min_delivery.is_zero() {
                    return Err(PaymentError::InsufficientExchangeRate(format!(
                        "sending {send} delivers nothing at minimum rate {min_rate}"
                    )));
                }
                (PaymentType::FixedSend, send, min_delivery)
            }
            Target::Deliver(deliver) => {
                let max_source = deliver
                    .multiply_ratio(min_rate.denominator(), min_rate.numerator(), Rounding::Ceil)
                    .map_err(|err| PaymentError::InvalidDestinationAmount(err.to_string()))?;
                (PaymentType::FixedDelivery, max_source, deliver)
            }
        };
        let estimated_packets = max_source_amount
            .div_ceil(max_packet.amount)
            .map_err(|err| PaymentError::ConnectorError(err.to_string()))?;

        let quote = Quote {
            payment_type,
            source_asset: request.source_asset,
            destination_asset,
            max_packet_amount: max_packet.amount,
            max_packet_exact: max_packet.exact,
            min_exchange_rate: min_rate,
            probed_rate: probed,
            min_delivery_amount,
            max_source_amount,
            estimated_packets,
        };
        info!(
            %payment_type,
            max_source = %quote.max_source_amount,
            min_delivery = %quote.min_delivery_amount,
            min_rate = %quote.min_exchange_rate,
            max_packet = %quote.max_packet_amount,
            packets = quote.estimated_packets,
            "quote ready"
        );
        Ok(quote)
    }

    fn reference_rate(
        &self,
        request: &QuoteRequest,
        destination_asset: &Asset,
    ) -> Result<Option<Ratio>, PaymentError> {
        let rate = match (&request.prices, &self.oracle) {
            (Some(prices), _) => reference_rate(prices, &request.source_asset, destination_asset),
            (None, Some(oracle)) => reference_rate(oracle, &request.source_asset, destination_asset),
            (None, None) => return Ok(None),
        };
        rate.map(Some)
            .map_err(|err| PaymentError::ExternalRateUnavailable(err.to_string()))
    }

    /// Search the max packet amount and bound the path rate from the same
    /// probes.
    async fn discover<C: ProbeChannel + ?Sized>(
        &self,
        prober: &mut Prober<'_, C>,
        assets: &mut AssetResolver,
    ) -> Result<(MaxPacket, ProbedRate), PaymentError> {
        let mut discoverer = MaxPacketDiscoverer::new();
        let mut rate = RateProbe::default();
        let max_rounds = self.config.max_rounds();

        let mut trials = MaxPacketDiscoverer::seed_amounts();
        for round in 1..=max_rounds {
            let results = prober.round(trials).await;
            for result in &results {
                check_reply(assets, result)?;
                discoverer.observe(result);
                rate.observe(result);
            }

            if discoverer.is_done() || !discoverer.has_evidence() {
                break;
            }
            match discoverer.next_trial(|amount| prober.was_tried(amount)) {
                Some(amount) => trials = vec![amount],
                None => break,
            }
            if round == max_rounds {
                warn!(max_rounds, known_good = %discoverer.known_good(), "max packet search stopped early");
            }
        }

        let max_packet = discoverer.result().ok_or_else(|| {
            PaymentError::RateProbeFailed("no probe reached the receiver".to_string())
        })?;
        if max_packet.amount.is_zero() {
            return Err(PaymentError::ConnectorError(
                "path max packet amount is zero".to_string(),
            ));
        }

        // Probe at the max packet amount for the tightest rate bound.
        let refine = rate
            .largest_sent()
            .is_none_or(|largest| max_packet.amount > largest);
        if refine && !prober.was_tried(max_packet.amount) {
            for result in &prober.round([max_packet.amount]).await {
                check_reply(assets, result)?;
                rate.observe(result);
            }
        }

        let probed = rate.rate().ok_or_else(|| {
            PaymentError::RateProbeFailed("receiver reported no delivered amount".to_string())
        })?;
        Ok((max_packet, probed))
    }
}

fn check_reply(assets: &mut AssetResolver, result: &ProbeResult) -> Result<(), PaymentError> {
    if result.closed_by_receiver {
        return Err(PaymentError::RateProbeFailed(
            "receiver closed the connection".to_string(),
        ));
    }
    assets.observe(&result.asset_declarations)
}
