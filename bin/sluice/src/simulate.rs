//! `sluice simulate`: quote a payment over an in-memory path.

use std::sync::Arc;

use color_eyre::eyre::{self, WrapErr, eyre};
use sluice_payment::{PaymentSetup, PaymentTarget, QuoteOptions, StaticConnector, StaticResolver};
use sluice_quote::{Quote, StreamCredentials};
use sluice_test_utils::SimulatedPath;
use tracing::info;

use crate::cli::SimulateArgs;

const RECEIVER_ADDRESS: &str = "private.sluice.simulated.receiver";

pub(crate) async fn run(args: SimulateArgs) -> eyre::Result<()> {
    args.quote.validate().map_err(|err| eyre!(err))?;

    let mut path = SimulatedPath::builder()
        .rate(args.rate.clone())
        .asset(args.destination.clone());
    if let Some(cap) = args.max_packet {
        path = path.max_packet(cap, args.max_packet_metadata);
    }
    let path = Arc::new(path.build());

    let credentials = StreamCredentials {
        destination_address: RECEIVER_ADDRESS.to_string(),
        shared_secret: vec![0; 32],
        destination_asset: None,
        invoice: None,
    };
    let setup = PaymentSetup::new(
        StaticResolver::new(),
        StaticConnector::new(Arc::clone(&path)),
        args.quote.clone(),
    );
    let session = setup
        .setup(PaymentTarget::Credentials(credentials))
        .await
        .wrap_err("payment setup failed")?;

    let mut options = QuoteOptions::new(args.source.clone());
    if let Some(amount) = args.send {
        options = options.send(amount);
    }
    if let Some(amount) = args.deliver {
        options = options.deliver(amount);
    }
    if let Some(slippage) = args.slippage {
        options = options.with_slippage(slippage);
    }
    if let Some(prices) = args.prices {
        options = options.with_prices(prices);
    }

    let quote = session.start_quote(options).await;
    session.close().await;
    let quote = quote.wrap_err("quote failed")?;

    info!(probes = path.probes_sent(), "simulation finished");
    print_quote(&quote);
    Ok(())
}

fn print_quote(quote: &Quote) {
    println!("payment type:        {}", quote.payment_type);
    println!("source asset:        {}", quote.source_asset);
    println!("destination asset:   {}", quote.destination_asset);
    println!(
        "max packet amount:   {}{}",
        quote.max_packet_amount,
        if quote.max_packet_exact { "" } else { " (lower bound)" }
    );
    println!("min exchange rate:   {}", quote.min_exchange_rate);
    println!(
        "probed rate:         [{}, {})",
        quote.probed_rate.lower, quote.probed_rate.upper
    );
    println!("max source amount:   {}", quote.max_source_amount);
    println!("min delivery amount: {}", quote.min_delivery_amount);
    println!("estimated packets:   {}", quote.estimated_packets);
}
