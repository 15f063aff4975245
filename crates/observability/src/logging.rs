use clap::{Args, ValueEnum};
use eyre::Context;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Target that verbosity flags apply to.
const CRATE_TARGET: &str = "sluice";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    #[serde(skip)]
    pub verbosity: u8,

    /// Log filter directive (e.g., "sluice_quote=trace").
    #[arg(long = "log.filter", value_name = "DIRECTIVE")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Log output format.
    #[arg(long = "log.format", value_enum, default_value_t = LogFormat::Text)]
    pub format: LogFormat,

    /// Include timestamps in logs.
    #[arg(long = "log.timestamps")]
    pub timestamps: bool,
}

impl LogArgs {
    /// Level applied to sluice crates.
    pub fn level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Build the filter.
    ///
    /// `RUST_LOG` replaces the default directives. `--log.filter` directives
    /// are always added on top.
    pub fn env_filter(&self) -> eyre::Result<EnvFilter> {
        let mut filter = if self.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!("warn,{CRATE_TARGET}={}", self.level()))
            })
        };

        if let Some(custom) = &self.filter {
            for directive in custom.split(',').filter(|d| !d.trim().is_empty()) {
                let directive = directive
                    .trim()
                    .parse()
                    .wrap_err_with(|| format!("invalid log directive {directive:?}"))?;
                filter = filter.add_directive(directive);
            }
        }
        Ok(filter)
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// command output.
pub fn init_logging(args: &LogArgs) -> eyre::Result<()> {
    let filter = args.env_filter()?;

    let layer = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let layer = match (args.format, args.timestamps) {
        (LogFormat::Json, _) => layer.json().boxed(),
        (LogFormat::Text, true) => layer.boxed(),
        (LogFormat::Text, false) => layer.without_time().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .wrap_err("failed to install tracing subscriber")?;
    Ok(())
}
