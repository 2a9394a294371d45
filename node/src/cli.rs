//! # CLI Interface
//!
//! Defines the command-line argument structure for `vitrine-node` using
//! `clap` derive. Supports three subcommands: `run`, `status`, and
//! `version`.

use clap::{Parser, Subcommand};

/// VITRINE marketplace node.
///
/// Serves the marketplace ledger over a REST + WebSocket API and exposes
/// Prometheus metrics. State lives in memory; there is no data directory
/// and nothing to initialize.
#[derive(Parser, Debug)]
#[command(
    name = "vitrine-node",
    about = "VITRINE marketplace node",
    version,
    propagate_version = true
)]
pub struct VitrineNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the VITRINE node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the marketplace node.
    Run(RunArgs),
    /// Query the status of a running node via its RPC endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST and WebSocket API.
    #[arg(long, env = "VITRINE_RPC_PORT", default_value_t = vitrine_market::config::DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "VITRINE_METRICS_PORT", default_value_t = vitrine_market::config::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "VITRINE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Network label reported by `/status` (e.g., "devnet", "mainnet").
    #[arg(long, env = "VITRINE_NETWORK", default_value = "devnet")]
    pub network: String,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// RPC endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:8890")]
    pub rpc_url: String,
}
