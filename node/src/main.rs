// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # VITRINE Marketplace Node
//!
//! Entry point for the `vitrine-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and serves the marketplace over the
//! HTTP/WebSocket API.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the marketplace node
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{broadcast, RwLock};

use vitrine_market::market::Marketplace;
use vitrine_market::nft::NftRegistry;
use vitrine_market::settlement::SettlementRail;

use cli::{Commands, VitrineNodeCli};
use logging::LogFormat;
use metrics::MarketMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = VitrineNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full marketplace node: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "vitrine_node=info,vitrine_market=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        network = %args.network,
        "starting vitrine-node"
    );

    // --- Marketplace ledger ---
    // In-memory collections and the recording settlement rail. The write
    // lock around the marketplace is the operation boundary: one
    // operation at a time, start to finish.
    let market = Arc::new(RwLock::new(Marketplace::new(
        NftRegistry::new(),
        SettlementRail::new(),
    )));

    // --- Metrics ---
    let market_metrics = Arc::new(MarketMetrics::new());

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(vitrine_market::config::EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            vitrine_market::config::PROTOCOL_VERSION,
        ),
        network: args.network.clone(),
        market,
        event_tx,
        events_forwarded: Arc::new(AtomicUsize::new(0)),
        metrics: Arc::clone(&market_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&market_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("vitrine-node stopped");
    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body: String = http_get_stub(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP GET without pulling in `reqwest` as a dependency.
/// In a real deployment, swap this for a proper HTTP client.
async fn http_get_stub(url: &str) -> Result<String> {
    // Use tokio's TCP stream + raw HTTP/1.1 to avoid adding reqwest.
    let parsed: url::Url = url
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid URL: {}", e))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("missing host in URL"))?;
    let port = parsed.port().unwrap_or(80);
    let path = parsed.path();

    let addr = format!("{}:{}", host, port);
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Strip HTTP headers — everything after the first blank line is the body.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Prints version information to stdout.
fn print_version() {
    println!("vitrine-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol     {}", vitrine_market::config::PROTOCOL_VERSION);
    println!("rustc        {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Minimal URL parser — just enough to extract host/port/path.
/// Avoids pulling in the `url` crate for a single use.
mod url {
    pub struct Url {
        host: String,
        port: Option<u16>,
        path: String,
    }

    impl Url {
        pub fn host_str(&self) -> Option<&str> {
            Some(&self.host)
        }

        pub fn port(&self) -> Option<u16> {
            self.port
        }

        pub fn path(&self) -> &str {
            &self.path
        }
    }

    impl std::str::FromStr for Url {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            // Strip scheme.
            let rest = s
                .strip_prefix("http://")
                .or_else(|| s.strip_prefix("https://"))
                .unwrap_or(s);

            let (authority, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, "/"),
            };

            let (host, port) = match authority.rfind(':') {
                Some(i) => {
                    let p = authority[i + 1..]
                        .parse::<u16>()
                        .map_err(|e| format!("bad port: {}", e))?;
                    (authority[..i].to_string(), Some(p))
                }
                None => (authority.to_string(), None),
            };

            Ok(Url {
                host,
                port,
                path: path.to_string(),
            })
        }
    }
}
