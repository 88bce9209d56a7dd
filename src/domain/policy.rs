//! The four-branch decision policy.
//!
//! One evaluation per tick walks an ordered ladder of (action, predicate)
//! pairs (swap, settle, cancel, place) and the first predicate that holds
//! with its cooldown elapsed wins the cycle. Cancel sub-reasons are always
//! evaluated in full and retained for reporting, whichever branch fires.

use super::book::{better_level, round_to_tick, tick_size};
use super::clock::{ActionClock, ActionKind};
use super::state::BotState;

/// Booleans behind the most recent cancel evaluation, kept for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelDiagnostics {
    /// Our ask is priced worse than the competitive best and either the next
    /// improving quote would sit too close to fair value, or our own price
    /// has drifted ≥1% above it.
    pub not_better_order: bool,
    /// Our resting size is the entire visible depth at its level and the
    /// next competitive ask is more than two ticks away.
    pub isolated_order: bool,
    /// Our best price has fallen within the cancel ratio of the swap rate:
    /// little edge left.
    pub narrowed_deviation: bool,
}

impl CancelDiagnostics {
    pub fn any(self) -> bool {
        self.not_better_order || self.isolated_order || self.narrowed_deviation
    }
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    /// At most one action per cycle; `None` means hold.
    pub action: Option<ActionKind>,
    /// Cancel sub-reasons from this evaluation, regardless of the winner.
    pub cancel: CancelDiagnostics,
}

/// Threshold set and evaluation logic for the control loop.
///
/// Ratios are quoted against the pool swap rate; amounts are human units.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    /// Wallet/unsettled quote balance above which swap/settle fire.
    pub dust_threshold: f64,
    /// Quote-to-rate ratio under which an improving quote is "too close".
    pub place_trigger_ratio: f64,
    /// Quote-to-rate ratio under which a resting quote has lost its edge.
    pub cancel_trigger_ratio: f64,
    /// Quote-to-rate ratio above which our own quote is hopelessly stale.
    pub stale_price_ratio: f64,
    /// Fractional drift from the last placed order that forces a re-quote.
    pub resize_deviation: f64,
    /// Markup over the swap rate used when the book offers no safe improve.
    pub place_markup: f64,
    /// Smallest size worth placing; below it the cycle is silently skipped.
    pub min_place_size: f64,
    /// Cumulative book depth treated as ignorable noise.
    pub ignore_depth_amount: f64,
    /// Decimal precision of the venue's price grid.
    pub tick_decimals: u32,
}

impl DecisionPolicy {
    pub fn new(ignore_depth_amount: f64, tick_decimals: u32) -> Self {
        Self {
            dust_threshold: 0.1,
            place_trigger_ratio: 1.003,
            cancel_trigger_ratio: 1.002,
            stale_price_ratio: 1.01,
            resize_deviation: 0.1,
            place_markup: 1.005,
            min_place_size: 1.0,
            ignore_depth_amount,
            tick_decimals,
        }
    }

    /// Evaluate the ladder in priority order; first ready predicate wins.
    pub fn decide(&self, state: &BotState, clock: &ActionClock) -> Decision {
        let (cancel_wanted, cancel) = self.wants_cancel(state);
        let ladder: [(ActionKind, bool); 4] = [
            (ActionKind::Swap, self.wants_swap(state)),
            (ActionKind::Settle, self.wants_settle(state)),
            (ActionKind::Cancel, cancel_wanted),
            (ActionKind::Place, self.wants_place(state)),
        ];
        for (kind, wanted) in ladder {
            if wanted && clock.ready(kind) {
                return Decision {
                    action: Some(kind),
                    cancel,
                };
            }
        }
        Decision {
            action: None,
            cancel,
        }
    }

    /// Quote sitting in the wallet means a fill was settled: rebalance it
    /// back into base through the pool.
    pub fn wants_swap(&self, state: &BotState) -> bool {
        state.user.quote.wallet > self.dust_threshold
    }

    /// Unsettled quote means a fill is waiting to be collected.
    pub fn wants_settle(&self, state: &BotState) -> bool {
        state.user.quote.unsettled > self.dust_threshold
    }

    /// Evaluate all three cancel sub-reasons against the current book.
    pub fn wants_cancel(&self, state: &BotState) -> (bool, CancelDiagnostics) {
        let mine = state.my_orders();
        if mine.is_empty() {
            return (false, CancelDiagnostics::default());
        }
        let rate = state.reserves.rate;
        if rate <= 0.0 {
            return (false, CancelDiagnostics::default());
        }
        let Some(better) =
            better_level(&state.market.asks, self.ignore_depth_amount, 0)
        else {
            return (false, CancelDiagnostics::default());
        };

        let tick = tick_size(self.tick_decimals);
        let future_better_price =
            round_to_tick(better.price - tick, self.tick_decimals);
        let min_price = mine
            .iter()
            .map(|o| o.price)
            .fold(f64::INFINITY, f64::min);
        let my_size_at_min: f64 = mine
            .iter()
            .filter(|o| o.price == min_price)
            .map(|o| o.size)
            .sum();

        let not_better_order = min_price > better.price
            && (future_better_price / rate > self.place_trigger_ratio
                || min_price / rate > self.stale_price_ratio);

        let level_at_mine = state
            .market
            .asks
            .iter()
            .find(|level| level.price == min_price);
        let isolated_order = level_at_mine
            .is_some_and(|level| level.size == my_size_at_min)
            && better_level(&state.market.asks, self.ignore_depth_amount, 1)
                .is_some_and(|next| {
                    round_to_tick(next.price - min_price, self.tick_decimals)
                        > tick * 2.0
                });

        let narrowed_deviation = min_price / rate < self.cancel_trigger_ratio;

        let diagnostics = CancelDiagnostics {
            not_better_order,
            isolated_order,
            narrowed_deviation,
        };
        (diagnostics.any(), diagnostics)
    }

    /// An empty own-order book is the signal to quote again.
    pub fn wants_place(&self, state: &BotState) -> bool {
        state.my_orders().is_empty()
    }

    /// Target price for a new resting sell: one tick under the better ask,
    /// or a fixed markup over the swap rate when that would quote too close
    /// to fair value.
    pub fn place_price(&self, state: &BotState) -> Option<f64> {
        let rate = state.reserves.rate;
        if rate <= 0.0 {
            return None;
        }
        let better =
            better_level(&state.market.asks, self.ignore_depth_amount, 0)?;
        let tick = tick_size(self.tick_decimals);
        let mut price = round_to_tick(better.price - tick, self.tick_decimals);
        if price / rate < self.place_trigger_ratio {
            price = round_to_tick(rate * self.place_markup, self.tick_decimals);
        }
        Some(price)
    }

    /// After a successful settle: has the filled size or the remaining
    /// unsettled amount drifted more than `resize_deviation` from the last
    /// placed order? If so the surviving quote should be cancelled in the
    /// same cycle.
    pub fn settle_resize_drift(&self, state: &BotState, unsettled_before: f64) -> bool {
        let last = state.user.last_order;
        if last.size <= 0.0 || last.price <= 0.0 {
            return false;
        }
        let min_size = state.min_my_order().map_or(0.0, |o| o.size);
        last.size - min_size > last.size * self.resize_deviation
            || unsettled_before / last.price > last.size * self.resize_deviation
    }
}
