//! Controller - Single-writer Decision Loop
//!
//! Owns the bot state, the cooldown clock, and the decision policy. One
//! task drains cache events and evaluates the decision ladder on a fixed
//! tick; at most one corrective action fires per cycle. A failed cycle is
//! logged and counted, never fatal.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, instrument, warn};

use crate::adapters::metrics::{HealthState, MetricsRegistry};
use crate::domain::clock::{ActionClock, ActionKind};
use crate::domain::policy::{CancelDiagnostics, DecisionPolicy};
use crate::domain::state::{BotState, CacheEvent};
use crate::ports::decoder::MarketDecoder;
use crate::ports::execution::OrderEntry;
use crate::ports::ledger::LedgerClient;
use crate::ports::notifier::Notifier;
use crate::usecases::actions::ActionRunner;
use crate::usecases::sync::StateSync;

/// Bid depth is informational only; refresh it on this tick cadence.
const BID_REFRESH_EVERY: u64 = 60;

/// The decision loop: owns state, drains events, fires actions.
pub struct Controller<E, L, N, D>
where
    E: OrderEntry,
    L: LedgerClient,
    N: Notifier,
    D: MarketDecoder,
{
    state: BotState,
    clock: ActionClock,
    policy: DecisionPolicy,
    runner: ActionRunner<E, L, N>,
    sync: Arc<StateSync<L, D>>,
    events_rx: mpsc::Receiver<CacheEvent>,
    events_tx: mpsc::Sender<CacheEvent>,
    tick: Duration,
    metrics: Arc<MetricsRegistry>,
    health: Arc<HealthState>,
}

impl<E, L, N, D> Controller<E, L, N, D>
where
    E: OrderEntry,
    L: LedgerClient,
    N: Notifier,
    D: MarketDecoder,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: BotState,
        clock: ActionClock,
        policy: DecisionPolicy,
        runner: ActionRunner<E, L, N>,
        sync: Arc<StateSync<L, D>>,
        events_rx: mpsc::Receiver<CacheEvent>,
        events_tx: mpsc::Sender<CacheEvent>,
        tick: Duration,
        metrics: Arc<MetricsRegistry>,
        health: Arc<HealthState>,
    ) -> Self {
        Self {
            state,
            clock,
            policy,
            runner,
            sync,
            events_rx,
            events_tx,
            tick,
            metrics,
            health,
        }
    }

    /// Drive the loop until shutdown, then cancel everything still resting.
    #[instrument(skip(self, shutdown_rx), fields(tick_ms = self.tick.as_millis() as u64))]
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut ticks: u64 = 0;

        info!("Controller loop started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested, cancelling resting orders");
                    self.runner
                        .run_cancel(&self.state, &mut self.clock, CancelDiagnostics::default())
                        .await;
                    break;
                }
                Some(event) = self.events_rx.recv() => {
                    self.metrics
                        .cache_events
                        .with_label_values(&[event.kind()])
                        .inc();
                    self.state.apply(event);
                }
                _ = interval.tick() => {
                    ticks += 1;
                    self.tick_once().await;
                    if ticks % BID_REFRESH_EVERY == 0 {
                        if let Err(err) = self.sync.refresh_bids(&self.events_tx).await {
                            warn!(error = %err, "Bid refresh failed");
                        }
                    }
                }
            }
        }
        self.health.controller_running.store(false, Ordering::Relaxed);
        info!("Controller loop stopped");
    }

    /// Evaluate the ladder once and fire at most one action.
    async fn tick_once(&mut self) {
        let started = Instant::now();
        self.publish_gauges();

        let decision = self.policy.decide(&self.state, &self.clock);
        match decision.action {
            Some(ActionKind::Swap) => {
                self.runner.run_swap(&self.state, &mut self.clock).await;
            }
            Some(ActionKind::Settle) => {
                self.runner
                    .run_settle(&self.state, &mut self.clock, &self.policy)
                    .await;
            }
            Some(ActionKind::Cancel) => {
                self.runner
                    .run_cancel(&self.state, &mut self.clock, decision.cancel)
                    .await;
            }
            Some(ActionKind::Place) => {
                self.runner
                    .run_place(&mut self.state, &mut self.clock, &self.policy)
                    .await;
            }
            None => {
                debug!(
                    rate = self.state.reserves.rate,
                    quote_wallet = self.state.user.quote.wallet,
                    own_orders = self.state.my_orders().len(),
                    "Holding"
                );
            }
        }

        self.metrics
            .tick_duration_us
            .observe(started.elapsed().as_micros() as f64);
    }

    fn publish_gauges(&self) {
        self.metrics.swap_rate.set(self.state.reserves.rate);
        self.metrics
            .balances
            .with_label_values(&["base", "wallet"])
            .set(self.state.user.base.wallet);
        self.metrics
            .balances
            .with_label_values(&["base", "unsettled"])
            .set(self.state.user.base.unsettled);
        self.metrics
            .balances
            .with_label_values(&["quote", "wallet"])
            .set(self.state.user.quote.wallet);
        self.metrics
            .balances
            .with_label_values(&["quote", "unsettled"])
            .set(self.state.user.quote.unsettled);
        self.metrics
            .open_orders
            .set(self.state.my_orders().len() as i64);
    }
}
