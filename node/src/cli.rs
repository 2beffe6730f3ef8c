//! # CLI Interface
//!
//! Command-line arguments for `miler-node`, defined with `clap` derive.
//! Every `run` flag also reads a `MILER_*` environment variable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use miler_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};

use crate::logging::LogFormat;

/// Miler chain node.
///
/// Serves a single hash-linked chain over HTTP and exposes Prometheus
/// metrics.
#[derive(Parser, Debug)]
#[command(
    name = "miler-node",
    about = "Miler hash-linked chain node",
    version,
    propagate_version = true
)]
pub struct MilerNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP node.
    Run(RunArgs),
    /// Check a chain JSON document offline.
    Verify(VerifyArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Interface to bind both listeners to.
    #[arg(long, env = "MILER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the REST API.
    #[arg(long, env = "MILER_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "MILER_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format.
    #[arg(long, env = "MILER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `verify` subcommand.
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Path to a chain document, as returned by `GET /api/blockchain`
    /// (either the bare chain or the `{ "chain": ... }` envelope).
    pub path: PathBuf,

    /// Also re-derive the genesis block's hash.
    #[arg(long)]
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        MilerNodeCli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = MilerNodeCli::try_parse_from(["miler-node", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.rpc_port, DEFAULT_RPC_PORT);
                assert_eq!(args.metrics_port, DEFAULT_METRICS_PORT);
                assert_eq!(args.log_format, LogFormat::Pretty);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn verify_takes_path_and_strict() {
        let cli =
            MilerNodeCli::try_parse_from(["miler-node", "verify", "chain.json", "--strict"])
                .unwrap();
        match cli.command {
            Commands::Verify(args) => {
                assert_eq!(args.path, PathBuf::from("chain.json"));
                assert!(args.strict);
            }
            other => panic!("expected verify, got {:?}", other),
        }
    }
}
