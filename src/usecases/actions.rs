//! Action Executors - Swap, Settle, Cancel, Place
//!
//! One executor per corrective action. Every executor stamps its cooldown
//! clock immediately before the suspending submit and once more after it
//! returns, so an overlapping tick can never re-fire the same action while
//! a slow call is in flight. Failures are caught here, logged, counted,
//! and reported; they never propagate into the control loop.

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::clock::{ActionClock, ActionKind};
use crate::domain::policy::{CancelDiagnostics, DecisionPolicy};
use crate::domain::state::{BotState, LastOrder};
use crate::ports::execution::{OrderEntry, OrderRequest};
use crate::ports::ledger::LedgerClient;
use crate::ports::notifier::{NoticeField, Notifier};
use crate::ports::swap::{PoolAccounts, SwapAdapter, SwapRoute};

/// Result of one place evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// An order was submitted (or would have been, in dry-run mode).
    Placed,
    /// The wallet size was below the minimum: silently skipped.
    BelowMinimum,
    /// No usable price this cycle, or the submission failed.
    Skipped,
}

/// Executes the four corrective actions against the venue.
pub struct ActionRunner<E: OrderEntry, L: LedgerClient, N: Notifier> {
    orders: Arc<E>,
    ledger: Arc<L>,
    notifier: Arc<N>,
    swap: Box<dyn SwapAdapter>,
    pool: PoolAccounts,
    route: SwapRoute,
    base_decimals: u32,
    quote_decimals: u32,
    /// Swap slippage tolerance in percent.
    slippage_pct: f64,
    /// When set, every submit is logged and skipped.
    dry_run: bool,
    metrics: Arc<MetricsRegistry>,
}

impl<E: OrderEntry, L: LedgerClient, N: Notifier> ActionRunner<E, L, N> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<E>,
        ledger: Arc<L>,
        notifier: Arc<N>,
        swap: Box<dyn SwapAdapter>,
        pool: PoolAccounts,
        route: SwapRoute,
        base_decimals: u32,
        quote_decimals: u32,
        slippage_pct: f64,
        dry_run: bool,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            orders,
            ledger,
            notifier,
            swap,
            pool,
            route,
            base_decimals,
            quote_decimals,
            slippage_pct,
            dry_run,
            metrics,
        }
    }

    /// Swap the whole quote wallet balance back into base through the pool.
    #[instrument(skip(self, state, clock))]
    pub async fn run_swap(&self, state: &BotState, clock: &mut ActionClock) {
        let amount_ui = state.user.quote.wallet;
        let rate = state.reserves.rate;
        if rate <= 0.0 {
            warn!("Swap requested with no pool rate yet, holding");
            return;
        }
        let min_out_ui = amount_ui / rate * (1.0 - self.slippage_pct / 100.0);

        let (amount_in, min_amount_out) = match (
            to_atomic(amount_ui, self.quote_decimals),
            to_atomic(min_out_ui, self.base_decimals),
        ) {
            (Ok(a), Ok(b)) => (a, b),
            _ => {
                error!(amount = amount_ui, "Swap amount does not fit atomic units");
                return;
            }
        };

        clock.stamp(ActionKind::Swap);
        if self.dry_run {
            info!(amount_in, min_amount_out, rate, "Dry-run: skipping swap");
            return;
        }

        let result = async {
            let instruction = self.swap.build_swap_instruction(
                &self.pool,
                &self.route,
                amount_in,
                min_amount_out,
            )?;
            let tx_id = self.ledger.submit(&[instruction]).await?;
            anyhow::Ok(tx_id)
        }
        .await;
        clock.stamp(ActionKind::Swap);

        match result {
            Ok(tx_id) => {
                self.metrics.actions_total.with_label_values(&["swap"]).inc();
                info!(tx_id = %tx_id, amount = amount_ui, rate, "Swap submitted");
                self.notifier
                    .success(
                        "Swapped quote into base",
                        &format!("{:.4} quote via {}", amount_ui, state.venue),
                        &tx_id,
                        &[
                            NoticeField::new("Amount In", format!("{amount_ui:.4}")),
                            NoticeField::new("Min Out", format!("{min_out_ui:.4}")),
                            NoticeField::new("Swap Rate", format!("{rate:.6}")),
                        ],
                    )
                    .await;
            }
            Err(err) => self.report_failure(ActionKind::Swap, &err).await,
        }
    }

    /// Collect unsettled quote into the wallet; if the fill behind it has
    /// drifted past the resize threshold, cancel the surviving quote in the
    /// same cycle.
    #[instrument(skip(self, state, clock, policy))]
    pub async fn run_settle(
        &self,
        state: &BotState,
        clock: &mut ActionClock,
        policy: &DecisionPolicy,
    ) {
        let unsettled_before = state.user.quote.unsettled;

        clock.stamp(ActionKind::Settle);
        if self.dry_run {
            info!(unsettled = unsettled_before, "Dry-run: skipping settle");
            return;
        }
        let result = self.orders.settle_funds().await;
        clock.stamp(ActionKind::Settle);

        let tx_id = match result {
            Ok(tx_id) => tx_id,
            Err(err) => {
                self.report_failure(ActionKind::Settle, &err).await;
                return;
            }
        };
        self.metrics
            .actions_total
            .with_label_values(&["settle"])
            .inc();
        info!(tx_id = %tx_id, unsettled = unsettled_before, "Settle submitted");
        self.notifier
            .info(
                "Settled funds",
                &format!("{unsettled_before:.4} quote collected"),
                &tx_id,
                &[NoticeField::new(
                    "Unsettled",
                    format!("{unsettled_before:.4}"),
                )],
            )
            .await;

        // A partial fill big enough to matter leaves stale-sized quotes on
        // the book. Cancel them all now rather than waiting for the cancel
        // branch, carrying whatever diagnostics the book shows right now.
        if policy.settle_resize_drift(state, unsettled_before) {
            let (_, diagnostics) = policy.wants_cancel(state);
            info!(
                unsettled = unsettled_before,
                "Resize drift after settle, cancelling resting orders"
            );
            self.run_cancel(state, clock, diagnostics).await;
        }
    }

    /// Cancel every own resting order, one transaction each.
    #[instrument(skip(self, state, clock))]
    pub async fn run_cancel(
        &self,
        state: &BotState,
        clock: &mut ActionClock,
        diagnostics: CancelDiagnostics,
    ) {
        let mine: Vec<_> = state.my_orders().into_iter().cloned().collect();
        if mine.is_empty() {
            return;
        }
        clock.stamp(ActionKind::Cancel);
        if self.dry_run {
            info!(orders = mine.len(), ?diagnostics, "Dry-run: skipping cancel");
            return;
        }
        for order in &mine {
            let result = self.orders.cancel_order(order).await;
            clock.stamp(ActionKind::Cancel);
            match result {
                Ok(tx_id) => {
                    self.metrics
                        .actions_total
                        .with_label_values(&["cancel"])
                        .inc();
                    info!(
                        tx_id = %tx_id,
                        price = order.price,
                        size = order.size,
                        "Cancel submitted"
                    );
                    self.notifier
                        .info(
                            "Cancelled resting order",
                            &format!("{:.4} @ {:.4}", order.size, order.price),
                            &tx_id,
                            &[
                                NoticeField::new(
                                    "Not Better",
                                    diagnostics.not_better_order,
                                ),
                                NoticeField::new("Isolated", diagnostics.isolated_order),
                                NoticeField::new(
                                    "Narrowed",
                                    diagnostics.narrowed_deviation,
                                ),
                            ],
                        )
                        .await;
                }
                Err(err) => self.report_failure(ActionKind::Cancel, &err).await,
            }
        }
    }

    /// Place one post-only resting sell for the whole base wallet balance.
    #[instrument(skip(self, state, clock, policy))]
    pub async fn run_place(
        &self,
        state: &mut BotState,
        clock: &mut ActionClock,
        policy: &DecisionPolicy,
    ) -> PlaceOutcome {
        let Some(price) = policy.place_price(state) else {
            return PlaceOutcome::Skipped;
        };
        let size = state.user.base.wallet;
        if size < policy.min_place_size {
            // Sub-minimum inventory is normal right after a fill; skip
            // without alerting.
            self.metrics.below_minimum_skips.inc();
            return PlaceOutcome::BelowMinimum;
        }

        clock.stamp(ActionKind::Place);
        if self.dry_run {
            info!(price, size, "Dry-run: skipping place");
            return PlaceOutcome::Placed;
        }
        let request = OrderRequest::new(price, size);
        let result = self.orders.place_order(&request).await;
        clock.stamp(ActionKind::Place);

        match result {
            Ok(tx_id) => {
                state.user.last_order = LastOrder { price, size };
                self.metrics
                    .actions_total
                    .with_label_values(&["place"])
                    .inc();
                info!(tx_id = %tx_id, price, size, "Place submitted");
                self.notifier
                    .info(
                        "Placed resting sell",
                        &format!("{size:.4} @ {price:.4}"),
                        &tx_id,
                        &[
                            NoticeField::new("Price", format!("{price:.4}")),
                            NoticeField::new("Size", format!("{size:.4}")),
                            NoticeField::new(
                                "Swap Rate",
                                format!("{:.6}", state.reserves.rate),
                            ),
                        ],
                    )
                    .await;
                PlaceOutcome::Placed
            }
            Err(err) => {
                self.report_failure(ActionKind::Place, &err).await;
                PlaceOutcome::Skipped
            }
        }
    }

    async fn report_failure(&self, kind: ActionKind, err: &anyhow::Error) {
        self.metrics
            .action_failures
            .with_label_values(&[kind.as_str()])
            .inc();
        error!(action = %kind, error = %err, "Action failed");
        self.notifier
            .error(&format!("{kind} failed"), &err.to_string())
            .await;
    }
}

/// Scale a human-unit amount into atomic units, truncating dust.
fn to_atomic(value: f64, decimals: u32) -> anyhow::Result<u64> {
    let scaled = Decimal::try_from(value)? * Decimal::from(10u64.pow(decimals));
    scaled
        .trunc()
        .to_u64()
        .ok_or_else(|| anyhow::anyhow!("amount {value} does not fit atomic units"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_atomic_truncates_dust() {
        assert_eq!(to_atomic(1.234_567_9, 6).unwrap(), 1_234_567);
        assert_eq!(to_atomic(0.0, 6).unwrap(), 0);
    }

    #[test]
    fn test_to_atomic_rejects_negative() {
        assert!(to_atomic(-1.0, 6).is_err());
    }
}
