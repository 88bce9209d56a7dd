//! Property-Based Tests - Domain Layer Invariants
//!
//! Uses `proptest` to verify that the decision domain and the endpoint
//! pool maintain their invariants across random inputs.

use proptest::prelude::*;

use amm_maker_bot::adapters::rpc::pool::{EndpointPool, MAX_WEIGHT, MIN_WEIGHT};
use amm_maker_bot::domain::book::{better_level, round_to_tick, tick_size, Level};
use amm_maker_bot::domain::clock::{ActionClock, ActionKind};
use amm_maker_bot::domain::policy::DecisionPolicy;
use amm_maker_bot::domain::rate::{swap_rate, SwapVenue};
use amm_maker_bot::domain::state::{BotState, CacheEvent};

// ── Endpoint Pool Properties ────────────────────────────────

proptest! {
    /// Weights stay inside [MIN_WEIGHT, MAX_WEIGHT] under any sequence of
    /// penalties and recoveries, and no endpoint is ever removed.
    #[test]
    fn pool_weights_stay_bounded(ops in prop::collection::vec(any::<(u8, bool)>(), 0..64)) {
        let urls: Vec<String> = (0..4).map(|i| format!("https://rpc-{i}.example")).collect();
        let pool = EndpointPool::new(urls.clone());

        for (pick, recover) in ops {
            if recover {
                pool.recover_all();
            } else {
                pool.penalize(&urls[pick as usize % urls.len()]);
            }
        }

        let weights = pool.weights();
        prop_assert_eq!(weights.len(), urls.len());
        for (_, weight) in weights {
            prop_assert!(weight >= MIN_WEIGHT);
            prop_assert!(weight <= MAX_WEIGHT);
        }
    }
}

// ── Book Lookup Properties ──────────────────────────────────

proptest! {
    /// The lookup always returns a level that is actually on the book.
    #[test]
    fn better_level_returns_a_book_member(
        sizes in prop::collection::vec(0.001f64..100.0, 1..20),
        ignore in 0.0f64..50.0,
        offset in 0usize..8,
    ) {
        let levels: Vec<Level> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| Level::new(10.0 + i as f64 * 0.01, size))
            .collect();
        let picked = better_level(&levels, ignore, offset).unwrap();
        prop_assert!(levels.iter().any(|l| l.price == picked.price));
    }

    /// Tick rounding is idempotent and never moves a price further than
    /// half a tick.
    #[test]
    fn round_to_tick_is_idempotent(value in 0.01f64..10_000.0, decimals in 0u32..6) {
        let rounded = round_to_tick(value, decimals);
        prop_assert_eq!(round_to_tick(rounded, decimals), rounded);
        prop_assert!((rounded - value).abs() <= tick_size(decimals) / 2.0 + 1e-9);
    }
}

// ── Swap Rate Properties ────────────────────────────────────

proptest! {
    /// The fee-adjusted rate is positive and above the fee-free midpoint
    /// for any positive reserves.
    #[test]
    fn swap_rate_positive_for_positive_reserves(
        base in 1_000.0f64..1e9,
        quote in 1_000.0f64..1e9,
    ) {
        let with_fee = swap_rate(base, quote, SwapVenue::Prism.fee_rate());
        let fee_free = swap_rate(base, quote, 0.0);
        prop_assert!(with_fee.is_finite());
        prop_assert!(with_fee > 0.0);
        prop_assert!(with_fee > fee_free);
    }
}

// ── Decision Ladder Properties ──────────────────────────────

proptest! {
    /// The ladder never asks to place while an own order is resting, and
    /// whatever it picks has its cooldown elapsed.
    #[test]
    fn ladder_respects_own_orders_and_cooldowns(
        quote_wallet in 0.0f64..20.0,
        quote_unsettled in 0.0f64..20.0,
        has_own_order in any::<bool>(),
    ) {
        let mut state = BotState::new(SwapVenue::Prism, "me".to_string());
        state.apply(CacheEvent::PoolBase(1_000_000.0));
        state.apply(CacheEvent::PoolQuote(1_000_000.0));
        state.apply(CacheEvent::QuoteWallet(quote_wallet));
        state.apply(CacheEvent::OpenOrders {
            base_unsettled: 0.0,
            quote_unsettled,
        });
        if has_own_order {
            state.apply(CacheEvent::AskBook {
                orders: vec![amm_maker_bot::domain::book::RestingOrder {
                    order_id: 1,
                    owner: "me".to_string(),
                    price: 5.0,
                    size: 2.0,
                }],
                levels: vec![Level::new(5.0, 2.0), Level::new(5.1, 60.0)],
            });
        }

        let clock = ActionClock::default();
        let decision = DecisionPolicy::new(6.0, 2).decide(&state, &clock);

        if let Some(kind) = decision.action {
            prop_assert!(clock.ready(kind));
            if kind == ActionKind::Place {
                prop_assert!(!has_own_order);
            }
        }
    }
}
