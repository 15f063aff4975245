//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use sluice_observability::LogArgs;
use sluice_pricing::PriceTable;
use sluice_primitives::{Amount, Asset, Ratio};
use sluice_quote::QuoteArgs;

/// Sluice - STREAM payment quoting
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Quote a payment over a simulated path
    Simulate(Box<SimulateArgs>),
}

/// Simulated path and quote request.
#[derive(Debug, Args)]
pub(crate) struct SimulateArgs {
    /// Asset the sender pays in, as CODE:scale
    #[arg(long, value_name = "ASSET")]
    pub(crate) source: Asset,

    /// Asset the receiver declares, as CODE:scale
    #[arg(long, value_name = "ASSET")]
    pub(crate) destination: Asset,

    /// Path exchange rate in destination units per source unit
    #[arg(long, default_value = "1", value_parser = parse_rate)]
    pub(crate) rate: Ratio,

    /// Largest packet the path forwards
    #[arg(long = "max-packet", value_name = "AMOUNT")]
    pub(crate) max_packet: Option<Amount>,

    /// Report the max packet amount in F08 rejects
    #[arg(long = "max-packet-metadata", requires = "max_packet")]
    pub(crate) max_packet_metadata: bool,

    /// Fixed amount to send, in source units
    #[arg(long, value_name = "AMOUNT", conflicts_with = "deliver")]
    pub(crate) send: Option<String>,

    /// Fixed amount to deliver, in destination units
    #[arg(long, value_name = "AMOUNT")]
    pub(crate) deliver: Option<String>,

    /// Asset prices, e.g. USD=1,XRP=0.5
    #[arg(long)]
    pub(crate) prices: Option<PriceTable>,

    /// Slippage for this quote, overriding --quote.slippage
    #[arg(long = "slippage", id = "request_slippage", value_name = "FRACTION")]
    pub(crate) slippage: Option<f64>,

    #[command(flatten)]
    pub(crate) quote: QuoteArgs,
}

fn parse_rate(s: &str) -> Result<Ratio, String> {
    let value = s.parse::<f64>().map_err(|err| err.to_string())?;
    Ratio::from_f64(value).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate(args: &[&str]) -> SimulateArgs {
        let argv = ["sluice", "simulate"].iter().chain(args);
        match Cli::parse_from(argv).command {
            Commands::Simulate(args) => *args,
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let args = simulate(&[
            "--source", "USD:9",
            "--destination", "XRP:6",
            "--rate", "0.0005",
            "--max-packet", "300324",
            "--send", "1000000",
            "--prices", "USD=1,XRP=2",
            "--quote.parallelism", "2",
        ]);
        assert_eq!(args.source, Asset::new("USD", 9));
        assert_eq!(args.destination, Asset::new("XRP", 6));
        assert_eq!(args.rate, Ratio::new(5u32, 10_000u32).unwrap());
        assert_eq!(args.max_packet, Some(Amount::new(300_324)));
        assert!(!args.max_packet_metadata);
        assert_eq!(args.send.as_deref(), Some("1000000"));
        assert_eq!(args.prices.map(|prices| prices.len()), Some(2));
        assert_eq!(args.quote.parallelism, 2);
    }

    #[test]
    fn test_slippage_flags_are_distinct() {
        let args = simulate(&[
            "--source", "USD:9",
            "--destination", "USD:9",
            "--send", "1000",
            "--slippage", "0.05",
            "--quote.slippage", "0.02",
        ]);
        assert_eq!(args.slippage, Some(0.05));
        assert_eq!(args.quote.slippage, 0.02);

        let args = simulate(&["--source", "USD:9", "--destination", "USD:9", "--send", "1000"]);
        assert_eq!(args.slippage, None);
    }

    #[test]
    fn test_send_conflicts_with_deliver() {
        let result = Cli::try_parse_from([
            "sluice", "simulate", "--source", "USD:2", "--destination", "USD:2",
            "--send", "1", "--deliver", "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_metadata_requires_cap() {
        let result = Cli::try_parse_from([
            "sluice", "simulate", "--source", "USD:2", "--destination", "USD:2",
            "--max-packet-metadata",
        ]);
        assert!(result.is_err());
    }
}
