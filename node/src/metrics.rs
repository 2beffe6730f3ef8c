//! # Prometheus Metrics
//!
//! Operational metrics for the chain node, scraped at `/metrics` on the
//! configured metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] prefixed with
//! `miler`, so they never collide with the default global registry.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Prometheus handles are internally reference-counted, so clones share
/// the same underlying values.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Chains created or reset through the API.
    pub chains_created_total: IntCounter,
    /// Blocks appended through the API.
    pub blocks_appended_total: IntCounter,
    /// Current number of blocks in the chain, genesis included.
    pub chain_length: IntGauge,
    /// Integrity checks run.
    pub validations_total: IntCounter,
    /// Integrity checks that found tampering or corruption.
    pub validation_failures_total: IntCounter,
    /// Time spent waiting for the write lock and appending, in seconds.
    pub append_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("miler".into()), None)
            .expect("failed to create prometheus registry");

        let chains_created_total = register(
            &registry,
            IntCounter::new(
                "chains_created_total",
                "Total number of chains created or reset",
            )
            .expect("metric creation"),
        );

        let blocks_appended_total = register(
            &registry,
            IntCounter::new("blocks_appended_total", "Total number of appended blocks")
                .expect("metric creation"),
        );

        let chain_length = register(
            &registry,
            IntGauge::new("chain_length", "Number of blocks in the chain")
                .expect("metric creation"),
        );

        let validations_total = register(
            &registry,
            IntCounter::new("validations_total", "Total number of chain integrity checks")
                .expect("metric creation"),
        );

        let validation_failures_total = register(
            &registry,
            IntCounter::new(
                "validation_failures_total",
                "Total number of integrity checks that found a violation",
            )
            .expect("metric creation"),
        );

        let append_latency_seconds = register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new(
                    "append_latency_seconds",
                    "Block append latency in seconds, lock wait included",
                )
                .buckets(vec![
                    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
                ]),
            )
            .expect("metric creation"),
        );

        Self {
            registry,
            chains_created_total,
            blocks_appended_total,
            chain_length,
            validations_total,
            validation_failures_total,
            append_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn register<M: Collector + Clone + 'static>(registry: &Registry, metric: M) -> M {
    registry
        .register(Box::new(metric.clone()))
        .expect("metric registration");
    metric
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
