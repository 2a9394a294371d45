//! # Prometheus Metrics
//!
//! Exposes operational metrics for the marketplace node. Scraped by
//! Prometheus at the `/metrics` HTTP endpoint on the configured metrics
//! port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so
//! they do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it
/// can be shared across request handlers.
#[derive(Clone)]
pub struct MarketMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of listings created.
    pub listings_created_total: IntCounter,
    /// Total number of listings cancelled by their sellers.
    pub listings_cancelled_total: IntCounter,
    /// Total number of listing price updates.
    pub price_updates_total: IntCounter,
    /// Total number of completed sales.
    pub items_sold_total: IntCounter,
    /// Cumulative sale volume (sum of listing prices), smallest unit.
    pub sale_volume_total: IntCounter,
    /// Total amount of proceeds paid out to sellers.
    pub proceeds_withdrawn_total: IntCounter,
    /// Current number of active listings.
    pub active_listings: IntGauge,
    /// Current sum of withdrawable seller balances.
    pub escrowed_proceeds: IntGauge,
    /// Histogram of marketplace operation latency in seconds.
    pub operation_latency_seconds: Histogram,
}

impl MarketMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("vitrine".into()), None)
            .expect("failed to create prometheus registry");

        let listings_created_total =
            IntCounter::new("listings_created_total", "Total number of listings created")
                .expect("metric creation");
        registry
            .register(Box::new(listings_created_total.clone()))
            .expect("metric registration");

        let listings_cancelled_total = IntCounter::new(
            "listings_cancelled_total",
            "Total number of listings cancelled by their sellers",
        )
        .expect("metric creation");
        registry
            .register(Box::new(listings_cancelled_total.clone()))
            .expect("metric registration");

        let price_updates_total = IntCounter::new(
            "price_updates_total",
            "Total number of listing price updates",
        )
        .expect("metric creation");
        registry
            .register(Box::new(price_updates_total.clone()))
            .expect("metric registration");

        let items_sold_total =
            IntCounter::new("items_sold_total", "Total number of completed sales")
                .expect("metric creation");
        registry
            .register(Box::new(items_sold_total.clone()))
            .expect("metric registration");

        let sale_volume_total = IntCounter::new(
            "sale_volume_total",
            "Cumulative sale volume in the smallest currency unit",
        )
        .expect("metric creation");
        registry
            .register(Box::new(sale_volume_total.clone()))
            .expect("metric registration");

        let proceeds_withdrawn_total = IntCounter::new(
            "proceeds_withdrawn_total",
            "Total amount of proceeds paid out to sellers",
        )
        .expect("metric creation");
        registry
            .register(Box::new(proceeds_withdrawn_total.clone()))
            .expect("metric registration");

        let active_listings =
            IntGauge::new("active_listings", "Current number of active listings")
                .expect("metric creation");
        registry
            .register(Box::new(active_listings.clone()))
            .expect("metric registration");

        let escrowed_proceeds = IntGauge::new(
            "escrowed_proceeds",
            "Current sum of withdrawable seller balances",
        )
        .expect("metric creation");
        registry
            .register(Box::new(escrowed_proceeds.clone()))
            .expect("metric registration");

        let operation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "operation_latency_seconds",
                "Marketplace operation latency in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(operation_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            listings_created_total,
            listings_cancelled_total,
            price_updates_total,
            items_sold_total,
            sale_volume_total,
            proceeds_withdrawn_total,
            active_listings,
            escrowed_proceeds,
            operation_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for MarketMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<MarketMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_contains_registered_metrics() {
        let metrics = MarketMetrics::new();
        metrics.listings_created_total.inc();
        metrics.active_listings.set(3);

        let body = metrics.encode().unwrap();
        assert!(body.contains("vitrine_listings_created_total"));
        assert!(body.contains("vitrine_active_listings 3"));
    }
}
