//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// drr-mux - weighted fan-in of synthetic flows
#[derive(Parser, Debug)]
#[command(
    name = "drr-mux",
    author,
    version,
    about = "Weighted Deficit Round Robin fan-in",
    long_about = "Merges weighted input flows into one bounded output using Deficit Round Robin.\n\n\
                  Flows and their synthetic producers are described in a TOML or JSON file; \n\
                  `run` reports how the delivered output was split between them."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DRR_MUX_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DRR_MUX_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Filter used when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scheduler over the configured flows
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display flows, weights and expected shares
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "drr.toml", env = "DRR_MUX_CONFIG")]
    pub config: PathBuf,

    /// Stop after this many output items (0 = unlimited)
    #[arg(long, default_value = "0", env = "DRR_MUX_MAX_ITEMS")]
    pub max_items: u64,

    /// Stop after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "DRR_MUX_TIMEOUT")]
    pub timeout: u64,

    /// Prometheus exporter port (0 = disabled)
    #[arg(long, default_value = "0", env = "DRR_MUX_METRICS_PORT")]
    pub metrics_port: u16,

    /// Output items per share sample in the report
    #[arg(long, default_value = "1000")]
    pub report_window: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "drr.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "drr.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
