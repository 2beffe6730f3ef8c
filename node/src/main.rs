// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Miler Node
//!
//! Entry point for the `miler-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and serves the chain over HTTP.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the HTTP node
//! - `verify`  — check a saved chain document offline
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use miler_protocol::storage::Chain;

use cli::{Commands, MilerNodeCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MilerNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Verify(args) => verify_command(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the API server and the metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "miler_node=info,miler_protocol=info,tower_http=debug",
        args.log_format,
    );

    tracing::info!(
        host = %args.host,
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        "starting miler-node"
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Application state ---
    let app_state = api::AppState::new(
        format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            miler_protocol::config::PROTOCOL_VERSION,
        ),
        Arc::clone(&node_metrics),
    );

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.host, args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("Your blockchain is running on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("{}:{}", args.host, args.metrics_port);
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
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("miler-node stopped");
    Ok(())
}

/// Outcome of checking a chain document.
#[derive(Debug)]
struct VerifyReport {
    id: String,
    length: usize,
    tail_hash: String,
}

/// Loads a chain document and runs the integrity check.
///
/// Accepts the bare chain or the `{ "chain": ... }` envelope served by
/// `GET /api/blockchain`.
fn verify_chain_file(path: &Path, strict: bool) -> Result<VerifyReport> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read chain document {}", path.display()))?;
    let mut doc: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    if let Some(inner) = doc.get_mut("chain").map(Value::take) {
        doc = inner;
    }

    let chain: Chain<Value> = serde_json::from_value(doc)
        .with_context(|| format!("{} is not a chain document", path.display()))?;

    let outcome = if strict {
        chain.verify_strict()
    } else {
        chain.verify()
    };
    outcome.with_context(|| format!("chain {} failed validation", chain.id()))?;

    Ok(VerifyReport {
        id: chain.id().to_string(),
        length: chain.len(),
        tail_hash: chain.tail().hash().to_string(),
    })
}

/// `verify` subcommand: prints a report, or fails with a non-zero exit.
fn verify_command(args: cli::VerifyArgs) -> Result<()> {
    logging::init_logging("miler_node=warn", logging::LogFormat::Pretty);

    let report = verify_chain_file(&args.path, args.strict)?;
    println!("Chain is valid.");
    println!("  Id     : {}", report.id);
    println!("  Blocks : {}", report.length);
    println!("  Tail   : {}", report.tail_hash);
    println!("  Strict : {}", args.strict);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("miler-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol   {}", miler_protocol::config::PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miler_protocol::storage::{Block, GenesisSeed};
    use std::io::Write;

    fn sample_chain() -> Chain<Value> {
        let mut chain =
            Chain::genesis("c1", "main", GenesisSeed::new("T0", Value::from("genesis-tx")))
                .unwrap();
        for i in 1..=3 {
            let candidate =
                Block::candidate(0, format!("T{}", i), Value::from(format!("tx{}", i))).unwrap();
            chain.append(candidate).unwrap();
        }
        chain
    }

    fn write_doc(doc: &Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string_pretty(doc).unwrap().as_bytes())
            .unwrap();
        file
    }

    #[test]
    fn verifies_bare_chain_document() {
        let chain = sample_chain();
        let file = write_doc(&serde_json::to_value(&chain).unwrap());

        let report = verify_chain_file(file.path(), false).unwrap();
        assert_eq!(report.id, "c1");
        assert_eq!(report.length, 4);
        assert_eq!(report.tail_hash, chain.tail().hash());
    }

    #[test]
    fn verifies_api_envelope() {
        let chain = sample_chain();
        let file = write_doc(&serde_json::json!({ "chain": chain }));
        assert!(verify_chain_file(file.path(), true).is_ok());
    }

    #[test]
    fn rejects_forged_document() {
        let mut doc = serde_json::to_value(sample_chain()).unwrap();
        doc["blockchain"][1]["transaction"] = Value::from("forged");
        let file = write_doc(&doc);

        let err = verify_chain_file(file.path(), false).unwrap_err();
        assert!(format!("{:#}", err).contains("hash mismatch"));
    }

    #[test]
    fn rejects_empty_chain_document() {
        let file = write_doc(&serde_json::json!({
            "id": "c1", "name": "main", "blockchain": [], "difficulty": 4
        }));
        assert!(verify_chain_file(file.path(), false).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = verify_chain_file(Path::new("/nonexistent/chain.json"), false).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
