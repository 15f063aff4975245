//! Payment setup and quoting sessions.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sluice_pricing::PriceOracle;
use sluice_primitives::Asset;
use sluice_probe::{ProbeChannel, Prober};
use sluice_quote::{
    AssetResolver, DefaultQuoteConfig, Destination, IlpAddress, Invoice, PaymentError, Quote,
    QuoteConfig, QuoteOptions, Quoter, SharedSecret,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::{DestinationResolver, PaymentTarget, ProbeConnector, ResolveTarget};

/// Resolves targets and opens [`PaymentSession`]s.
pub struct PaymentSetup<R, P, Cfg = DefaultQuoteConfig> {
    resolver: R,
    connector: P,
    config: Cfg,
    oracle: Option<Arc<dyn PriceOracle>>,
}

impl<R, P, Cfg> PaymentSetup<R, P, Cfg>
where
    R: DestinationResolver,
    P: ProbeConnector,
    Cfg: QuoteConfig + Clone,
{
    pub fn new(resolver: R, connector: P, config: Cfg) -> Self {
        Self {
            resolver,
            connector,
            config,
            oracle: None,
        }
    }

    /// Price oracle handed to every session's quoter.
    pub fn with_oracle(mut self, oracle: Arc<dyn PriceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Resolve a target into a validated destination. Raw credentials are
    /// validated locally without querying the resolver.
    #[instrument(skip_all)]
    pub async fn resolve(&self, target: PaymentTarget) -> Result<Destination, PaymentError> {
        let credentials = match target {
            PaymentTarget::Credentials(credentials) => credentials,
            PaymentTarget::PaymentPointer(pointer) => {
                debug!(%pointer, endpoint = %pointer.endpoint(), "resolving payment pointer");
                self.resolver
                    .resolve(&ResolveTarget::Spsp(pointer.endpoint().clone()))
                    .await?
            }
            PaymentTarget::InvoiceUrl(url) => {
                debug!(%url, "resolving invoice");
                self.resolver.resolve(&ResolveTarget::Invoice(url)).await?
            }
        };
        Destination::from_credentials(credentials)
            .map_err(|err| PaymentError::InvalidCredentials(err.to_string()))
    }

    /// Resolve, connect and learn the destination asset.
    #[instrument(skip_all)]
    pub async fn setup(
        &self,
        target: PaymentTarget,
    ) -> Result<PaymentSession<P::Channel, Cfg>, PaymentError> {
        let destination = self.resolve(target).await?;
        if let Some(invoice) = destination.invoice() {
            if invoice.remaining().is_none() {
                return Err(PaymentError::InvoiceAlreadyPaid(format!(
                    "{} of {} delivered",
                    invoice.amount_delivered, invoice.amount_to_deliver
                )));
            }
        }

        let (channel, destination, destination_asset) = self.establish(destination).await?;

        info!(
            destination = %destination.address(),
            asset = %destination_asset,
            "payment session established"
        );
        let mut quoter = Quoter::new(self.config.clone());
        if let Some(oracle) = &self.oracle {
            quoter = quoter.with_oracle(Arc::clone(oracle));
        }
        Ok(PaymentSession {
            destination,
            destination_asset,
            channel,
            quoter,
            closed: AtomicBool::new(false),
        })
    }

    /// Connect and resolve the destination asset within the session timeout.
    /// The channel is closed on every failure after it was opened.
    async fn establish(
        &self,
        destination: Destination,
    ) -> Result<(P::Channel, Destination, Asset), PaymentError> {
        let timeout = self.config.session_timeout();
        let deadline = Instant::now() + timeout;
        let timed_out =
            || PaymentError::EstablishmentFailed(format!("setup did not finish within {timeout:?}"));

        let channel = tokio::time::timeout_at(deadline, self.connector.connect(&destination))
            .await
            .map_err(|_| timed_out())?
            .map_err(|err| PaymentError::EstablishmentFailed(err.to_string()))?;

        let mut assets = AssetResolver::new(destination.asset_binding().clone());
        let resolved = {
            let mut prober = Prober::new(&channel, self.config.probe_policy());
            tokio::time::timeout_at(
                deadline,
                assets.resolve(&mut prober, self.config.asset_probe_amounts()),
            )
            .await
            .unwrap_or_else(|_| Err(timed_out()))
        };
        match resolved {
            Ok(asset) => {
                let destination = destination.with_asset(assets.binding().clone());
                Ok((channel, destination, asset))
            }
            Err(err) => {
                channel.close().await;
                Err(err)
            }
        }
    }
}

/// Set up a payment with the default quoting configuration.
pub async fn setup_payment<R, P>(
    resolver: R,
    connector: P,
    target: PaymentTarget,
) -> Result<PaymentSession<P::Channel, DefaultQuoteConfig>, PaymentError>
where
    R: DestinationResolver,
    P: ProbeConnector,
{
    PaymentSetup::new(resolver, connector, DefaultQuoteConfig)
        .setup(target)
        .await
}

/// Established connection to a destination with a known asset.
///
/// Every [`start_quote`](Self::start_quote) runs a fresh quoting session; no
/// probe state carries over between quotes.
pub struct PaymentSession<C, Cfg = DefaultQuoteConfig> {
    destination: Destination,
    destination_asset: Asset,
    channel: C,
    quoter: Quoter<Cfg>,
    closed: AtomicBool,
}

impl<C, Cfg> fmt::Debug for PaymentSession<C, Cfg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSession")
            .field("destination", &self.destination)
            .field("destination_asset", &self.destination_asset)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<C: ProbeChannel, Cfg: QuoteConfig> PaymentSession<C, Cfg> {
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn destination_address(&self) -> &IlpAddress {
        self.destination.address()
    }

    pub fn shared_secret(&self) -> &SharedSecret {
        self.destination.shared_secret()
    }

    pub fn destination_asset(&self) -> &Asset {
        &self.destination_asset
    }

    pub fn invoice(&self) -> Option<&Invoice> {
        self.destination.invoice()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Quote a payment over this session's connection.
    #[instrument(skip_all, fields(destination = %self.destination.address()))]
    pub async fn start_quote(&self, options: QuoteOptions) -> Result<Quote, PaymentError> {
        if self.is_closed() {
            return Err(PaymentError::EstablishmentFailed(
                "payment session is closed".to_string(),
            ));
        }
        self.quoter
            .quote(&self.channel, &self.destination, options)
            .await
    }

    /// Close the connection. Later calls do nothing.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(destination = %self.destination.address(), "closing payment session");
        self.channel.close().await;
    }
}
