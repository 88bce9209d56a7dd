//! Prometheus Metrics Registry - Control-loop Observability
//!
//! Registers and exposes Prometheus metrics for the decision loop:
//! actions fired per kind, failures, cache freshness, the live swap rate
//! and balances, and endpoint pool weights.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry, TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// Centralized Prometheus metrics for the bot.
///
/// All metrics follow the naming convention `amm_maker_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Actions fired, labeled by kind.
    pub actions_total: IntCounterVec,
    /// Action failures caught at the executor boundary, by kind.
    pub action_failures: IntCounterVec,
    /// Place decisions skipped because the size was below minimum.
    pub below_minimum_skips: IntCounter,
    /// Cache events applied, labeled by resource.
    pub cache_events: IntCounterVec,
    /// Current fee-adjusted swap rate from the pool.
    pub swap_rate: Gauge,
    /// Wallet and unsettled balances, labeled by token and bucket.
    pub balances: GaugeVec,
    /// Number of own resting orders on the book.
    pub open_orders: IntGauge,
    /// Endpoint weight per RPC URL.
    pub endpoint_weight: GaugeVec,
    /// Tick evaluation latency in microseconds.
    pub tick_duration_us: Histogram,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let actions_total = IntCounterVec::new(
            Opts::new("amm_maker_actions_total", "Actions fired by kind"),
            &["kind"],
        )?;
        let action_failures = IntCounterVec::new(
            Opts::new(
                "amm_maker_action_failures_total",
                "Action failures caught at the executor boundary",
            ),
            &["kind"],
        )?;
        let below_minimum_skips = IntCounter::new(
            "amm_maker_below_minimum_skips_total",
            "Place decisions skipped for sub-minimum size",
        )?;
        let cache_events = IntCounterVec::new(
            Opts::new("amm_maker_cache_events_total", "Cache events applied"),
            &["resource"],
        )?;
        let swap_rate = Gauge::new(
            "amm_maker_swap_rate",
            "Fee-adjusted quote-per-base pool rate",
        )?;
        let balances = GaugeVec::new(
            Opts::new("amm_maker_balance", "Token balances in human units"),
            &["token", "bucket"],
        )?;
        let open_orders = IntGauge::new(
            "amm_maker_open_orders",
            "Own resting orders currently on the book",
        )?;
        let endpoint_weight = GaugeVec::new(
            Opts::new("amm_maker_endpoint_weight", "Adaptive RPC endpoint weight"),
            &["endpoint"],
        )?;
        let tick_duration_us = Histogram::with_opts(
            HistogramOpts::new(
                "amm_maker_tick_duration_us",
                "Tick evaluation latency in microseconds",
            )
            .buckets(vec![10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 20000.0]),
        )?;

        registry.register(Box::new(actions_total.clone()))?;
        registry.register(Box::new(action_failures.clone()))?;
        registry.register(Box::new(below_minimum_skips.clone()))?;
        registry.register(Box::new(cache_events.clone()))?;
        registry.register(Box::new(swap_rate.clone()))?;
        registry.register(Box::new(balances.clone()))?;
        registry.register(Box::new(open_orders.clone()))?;
        registry.register(Box::new(endpoint_weight.clone()))?;
        registry.register(Box::new(tick_duration_us.clone()))?;

        Ok(Self {
            registry,
            actions_total,
            action_failures,
            below_minimum_skips,
            cache_events,
            swap_rate,
            balances,
            open_orders,
            endpoint_weight,
            tick_duration_us,
        })
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new()
            .route("/metrics", get(move || async move { metrics_self.render() }));

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
