//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Raddec Relay - fan-out of radio decodings to UDP, webhook and document-store targets
#[derive(Parser, Debug)]
#[command(
    name = "raddec-relay",
    author,
    version,
    about = "Raddec fan-out relay",
    long_about = "Forwards raddecs and derived proximity / digest events to configured targets.\n\n\
                  Datagram targets are re-resolved periodically, webhooks share keep-alive \n\
                  connection pools, and document-store writes are create-only."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RADDEC_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RADDEC_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "gateway.toml",
        env = "RADDEC_RELAY_CONFIG"
    )]
    pub config: PathBuf,

    /// Raddec input as JSON lines ("-" for stdin)
    #[arg(short, long, env = "RADDEC_RELAY_INPUT", conflicts_with = "mock_rate")]
    pub input: Option<PathBuf>,

    /// Derived-event input as JSON lines
    #[arg(long, env = "RADDEC_RELAY_DERIVED_INPUT")]
    pub derived_input: Option<PathBuf>,

    /// Hand every raddec to an external aggregator through this file or FIFO
    #[arg(long, env = "RADDEC_RELAY_AGGREGATOR_OUTPUT")]
    pub aggregator_output: Option<PathBuf>,

    /// Generate synthetic raddecs at this rate (Hz) instead of reading input
    #[arg(long, env = "RADDEC_RELAY_MOCK_RATE")]
    pub mock_rate: Option<f64>,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size for internal queues
    #[arg(long, default_value = "100", env = "RADDEC_RELAY_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RADDEC_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "gateway.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "gateway.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show every configured target
    #[arg(long)]
    pub targets: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let cli = Cli::parse_from([
            "raddec-relay",
            "-v",
            "run",
            "--config",
            "relay.toml",
            "--input",
            "-",
            "--derived-input",
            "derived.ndjson",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("relay.toml"));
                assert_eq!(args.input, Some(PathBuf::from("-")));
                assert_eq!(args.derived_input, Some(PathBuf::from("derived.ndjson")));
                assert_eq!(args.buffer_size, 100);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_input_conflicts_with_mock() {
        let result = Cli::try_parse_from([
            "raddec-relay",
            "run",
            "--input",
            "raddecs.ndjson",
            "--mock-rate",
            "5",
        ]);
        assert!(result.is_err());
    }
}
