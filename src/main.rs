//! AMM Maker Bot - Entry Point
//!
//! Initializes configuration, logging, the pooled ledger client, and the
//! decision-loop controller. Runs until SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Build the weighted endpoint pool + pooled ledger client
//! 4. Build the layout decoder, order entry, swap builder, notifier
//! 5. Spawn metrics + health servers
//! 6. Initial account refresh + subscription pumps
//! 7. Spawn the controller loop (tokio::select! over events and ticks)
//! 8. Wait for SIGINT, then graceful shutdown (cancel all, drain, exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use adapters::notify::WebhookNotifier;
use adapters::rpc::{EndpointPool, LedgerClientConfig, PooledLedgerClient};
use adapters::venue::{
    for_venue, DecoderConfig, LayoutDecoder, MarketAccounts, VenueOrderEntry, WireScaling,
};
use domain::clock::ActionClock;
use domain::policy::DecisionPolicy;
use domain::state::{BotState, CacheEvent};
use ports::swap::{PoolAccounts, SwapRoute};
use usecases::{ActionRunner, Controller, StateSync, WatchedAccounts};

/// Cache event channel depth; pushes beyond it apply backpressure.
const EVENT_CHANNEL_DEPTH: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    let default_level = if config.bot.debug {
        "debug".to_string()
    } else {
        config.bot.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&default_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.bot.dry_run,
        venue = %config.pool.venue,
        endpoints = config.rpc.endpoints.len(),
        "Starting AMM Maker Bot"
    );
    if config.bot.dry_run {
        warn!("Dry-run mode: decisions computed but nothing submitted");
    }

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Weighted endpoint pool + pooled ledger client ────
    let pool = Arc::new(EndpointPool::new(config.rpc.endpoints.clone()));
    let health = Arc::new(HealthState::new());
    let ledger = Arc::new(
        PooledLedgerClient::new(
            Arc::clone(&pool),
            LedgerClientConfig {
                commitment: config.rpc.commitment.clone(),
                signer_identity: config.rpc.signer_identity.clone(),
                timeout: Duration::from_millis(config.rpc.timeout_ms),
            },
        )
        .context("Failed to create ledger client")?
        .with_subscription_health(Arc::clone(&health.subscriptions_healthy)),
    );

    // ── 5. Decoder, order entry, swap builder, notifier ─────
    let decoder = Arc::new(LayoutDecoder::new(DecoderConfig {
        price_decimals: config.market.min_order_quantity_decimals,
        size_decimals: config.market.base_decimals,
    }));
    let orders = Arc::new(VenueOrderEntry::new(
        Arc::clone(&ledger),
        MarketAccounts {
            market: config.market.address.clone(),
            program: config.market.program.clone(),
            open_orders: config.market.open_orders_account.clone(),
            base_wallet: config.market.base_wallet_account.clone(),
            quote_wallet: config.market.quote_wallet_account.clone(),
            owner: config.rpc.signer_identity.clone(),
        },
        WireScaling {
            price_decimals: config.market.min_order_quantity_decimals,
            size_decimals: config.market.base_decimals,
        },
    ));
    let swap = for_venue(config.pool.venue);
    let notifier = Arc::new(WebhookNotifier::new(
        config.alerts.webhook_url.clone(),
        config.alerts.username.clone(),
    ));

    // ── 6. Metrics registry + health/metrics servers ────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to build metrics")?);
    if config.metrics.enabled {
        let bind = config.metrics.bind_address.clone();
        let metrics_ref = Arc::clone(&metrics);
        let metrics_shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = metrics_ref.serve(bind, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        });
        let health_server = HealthServer::new(Arc::clone(&health), 8080);
        let health_shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = health_server.run(health_shutdown).await {
                error!(error = %e, "Health server failed");
            }
        });
        // Publish endpoint weights on a slow cadence.
        let weight_pool = Arc::clone(&pool);
        let weight_metrics = Arc::clone(&metrics);
        let mut weight_shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                tokio::select! {
                    _ = weight_shutdown.recv() => break,
                    _ = interval.tick() => {
                        for (url, weight) in weight_pool.weights() {
                            weight_metrics
                                .endpoint_weight
                                .with_label_values(&[&url])
                                .set(f64::from(weight));
                        }
                    }
                }
            }
        });
    }

    // ── 7. Initial refresh + subscription pumps ─────────────
    let (events_tx, mut events_rx) = mpsc::channel::<CacheEvent>(EVENT_CHANNEL_DEPTH);
    let sync = Arc::new(StateSync::new(
        Arc::clone(&ledger),
        Arc::clone(&decoder),
        WatchedAccounts::from_config(&config.market, &config.pool),
    ));
    sync.initial_refresh(&events_tx)
        .await
        .context("Initial account refresh failed")?;
    sync.spawn_pumps(events_tx.clone())
        .await
        .context("Failed to start subscription pumps")?;

    // Drain the bootstrap events into the state before the loop starts,
    // then seed the last-order bookkeeping from whatever is already resting.
    let mut state = BotState::new(
        config.pool.venue,
        config.market.open_orders_account.clone(),
    );
    while let Ok(event) = events_rx.try_recv() {
        state.apply(event);
    }
    state.seed_last_order();

    // ── 8. Wire and spawn the controller ────────────────────
    let runner = ActionRunner::new(
        orders,
        Arc::clone(&ledger),
        notifier,
        swap,
        PoolAccounts {
            token_swap: config.pool.token_swap.clone(),
            authority: config.pool.authority.clone(),
            pool_mint: config.pool.pool_mint.clone(),
            fee_account: config.pool.fee_account.clone(),
            base_reserve: config.pool.base_reserve_account.clone(),
            quote_reserve: config.pool.quote_reserve_account.clone(),
        },
        SwapRoute {
            user_source: config.market.quote_wallet_account.clone(),
            user_destination: config.market.base_wallet_account.clone(),
            authority: config.rpc.signer_identity.clone(),
        },
        config.market.base_decimals,
        config.market.quote_decimals,
        config.bot.slippage_pct,
        config.bot.dry_run,
        Arc::clone(&metrics),
    );
    let controller = Controller::new(
        state,
        ActionClock::new(Duration::from_millis(config.bot.cooldown_ms)),
        DecisionPolicy::new(
            config.market.ignore_depth_amount,
            config.market.min_order_quantity_decimals,
        ),
        runner,
        Arc::clone(&sync),
        events_rx,
        events_tx,
        Duration::from_millis(config.bot.tick_ms),
        Arc::clone(&metrics),
        Arc::clone(&health),
    );
    let controller_shutdown = shutdown_tx.subscribe();
    let controller_handle = tokio::spawn(controller.run(controller_shutdown));

    info!("All tasks spawned, bot is running");

    // ── 9. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    // ── Graceful shutdown: signal, cancel, drain, exit ──────
    let _ = shutdown_tx.send(());

    // The controller's shutdown branch cancels all resting orders before
    // it exits; give it time to finish that pass.
    if tokio::time::timeout(Duration::from_secs(30), controller_handle)
        .await
        .is_err()
    {
        warn!("Controller did not stop within 30s");
    }

    info!("Shutdown complete");
    Ok(())
}
