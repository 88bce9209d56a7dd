//! Integration Tests - Decision Loop Against Mock Adapters
//!
//! Exercises the action executors and the decision ladder through the
//! port traits. Uses mockall for trait mocking and tokio::test for
//! async tests.

use std::sync::Arc;
use std::time::Duration;

use mockall::mock;

use amm_maker_bot::adapters::metrics::MetricsRegistry;
use amm_maker_bot::domain::book::{Level, RestingOrder};
use amm_maker_bot::domain::clock::{ActionClock, ActionKind};
use amm_maker_bot::domain::policy::{CancelDiagnostics, DecisionPolicy};
use amm_maker_bot::domain::rate::SwapVenue;
use amm_maker_bot::domain::state::{BotState, CacheEvent, LastOrder};
use amm_maker_bot::ports::execution::{OrderEntry, OrderRequest};
use amm_maker_bot::ports::ledger::{Instruction, InstructionAccount, LedgerClient, LedgerError, TxId};
use amm_maker_bot::ports::notifier::{NoticeField, Notifier};
use amm_maker_bot::ports::swap::{PoolAccounts, SwapAdapter, SwapRoute};
use amm_maker_bot::usecases::{ActionRunner, PlaceOutcome};

// ---- Mock Definitions ----

mock! {
    pub Orders {}

    #[async_trait::async_trait]
    impl OrderEntry for Orders {
        async fn place_order(&self, request: &OrderRequest) -> anyhow::Result<TxId>;
        async fn cancel_order(&self, order: &RestingOrder) -> anyhow::Result<TxId>;
        async fn settle_funds(&self) -> anyhow::Result<TxId>;
    }
}

mock! {
    pub Ledger {}

    #[async_trait::async_trait]
    impl LedgerClient for Ledger {
        async fn read_account(&self, address: &String) -> Result<Vec<u8>, LedgerError>;
        async fn subscribe_account(
            &self,
            address: &String,
        ) -> Result<tokio::sync::mpsc::Receiver<Vec<u8>>, LedgerError>;
        async fn submit(&self, instructions: &[Instruction]) -> Result<TxId, LedgerError>;
    }
}

mock! {
    pub Alerts {}

    #[async_trait::async_trait]
    impl Notifier for Alerts {
        async fn info(&self, title: &str, description: &str, tx_id: &str, fields: &[NoticeField]);
        async fn success(&self, title: &str, description: &str, tx_id: &str, fields: &[NoticeField]);
        async fn error(&self, title: &str, description: &str);
    }
}

/// Swap builder returning a fixed empty-data instruction.
struct StubSwap;

impl SwapAdapter for StubSwap {
    fn build_swap_instruction(
        &self,
        pool: &PoolAccounts,
        route: &SwapRoute,
        _amount_in: u64,
        _min_amount_out: u64,
    ) -> anyhow::Result<Instruction> {
        Ok(Instruction {
            program: "stub-program".to_string(),
            accounts: vec![
                InstructionAccount::readonly(pool.token_swap.clone()),
                InstructionAccount::writable(route.user_source.clone()),
            ],
            data: vec![],
        })
    }
}

// ---- Test Fixtures ----

const ME: &str = "my-open-orders";

fn pool_accounts() -> PoolAccounts {
    PoolAccounts {
        token_swap: "pool".to_string(),
        authority: "authority".to_string(),
        pool_mint: "mint".to_string(),
        fee_account: "fees".to_string(),
        base_reserve: "base-reserve".to_string(),
        quote_reserve: "quote-reserve".to_string(),
    }
}

fn swap_route() -> SwapRoute {
    SwapRoute {
        user_source: "quote-wallet".to_string(),
        user_destination: "base-wallet".to_string(),
        authority: "signer".to_string(),
    }
}

fn runner(
    orders: MockOrders,
    ledger: MockLedger,
    notifier: MockAlerts,
) -> ActionRunner<MockOrders, MockLedger, MockAlerts> {
    ActionRunner::new(
        Arc::new(orders),
        Arc::new(ledger),
        Arc::new(notifier),
        Box::new(StubSwap),
        pool_accounts(),
        swap_route(),
        6,
        6,
        1.0,
        false,
        Arc::new(MetricsRegistry::new().unwrap()),
    )
}

fn my_order(price: f64, size: f64) -> RestingOrder {
    RestingOrder {
        order_id: 42,
        owner: ME.to_string(),
        price,
        size,
    }
}

/// State with live million-unit pool reserves (rate near 1.003).
fn priced_state() -> BotState {
    let mut state = BotState::new(SwapVenue::Prism, ME.to_string());
    state.apply(CacheEvent::PoolBase(1_000_000.0));
    state.apply(CacheEvent::PoolQuote(1_000_000.0));
    state
}

fn quiet_notifier() -> MockAlerts {
    let mut alerts = MockAlerts::new();
    alerts.expect_info().returning(|_, _, _, _| ());
    alerts.expect_success().returning(|_, _, _, _| ());
    alerts.expect_error().never();
    alerts
}

// ---- Integration Tests ----

#[tokio::test]
async fn test_cooldown_prevents_double_placement() {
    let mut state = priced_state();
    state.apply(CacheEvent::BaseWallet(5.0));
    state.apply(CacheEvent::AskBook {
        orders: vec![],
        levels: vec![Level::new(1.50, 3.0), Level::new(1.60, 80.0)],
    });

    let mut orders = MockOrders::new();
    orders
        .expect_place_order()
        .times(1)
        .returning(|_| Ok("tx-place".to_string()));
    let runner = runner(orders, MockLedger::new(), quiet_notifier());

    let policy = DecisionPolicy::new(6.0, 2);
    let mut clock = ActionClock::new(Duration::from_secs(10));

    let first = policy.decide(&state, &clock);
    assert_eq!(first.action, Some(ActionKind::Place));
    let outcome = runner.run_place(&mut state, &mut clock, &policy).await;
    assert_eq!(outcome, PlaceOutcome::Placed);

    // The book has not echoed the new order back yet, so the predicate
    // still wants to place; only the cooldown holds it off.
    let second = policy.decide(&state, &clock);
    assert_eq!(second.action, None);
}

#[tokio::test]
async fn test_swap_outranks_settle_and_submits_via_ledger() {
    let mut state = priced_state();
    state.apply(CacheEvent::QuoteWallet(12.0));
    state.apply(CacheEvent::OpenOrders {
        base_unsettled: 0.0,
        quote_unsettled: 4.0,
    });

    let mut orders = MockOrders::new();
    orders.expect_settle_funds().never();
    let mut ledger = MockLedger::new();
    ledger
        .expect_submit()
        .times(1)
        .returning(|_| Ok("tx-swap".to_string()));
    let runner = runner(orders, ledger, quiet_notifier());

    let policy = DecisionPolicy::new(6.0, 2);
    let mut clock = ActionClock::new(Duration::from_secs(10));

    let decision = policy.decide(&state, &clock);
    assert_eq!(decision.action, Some(ActionKind::Swap));
    runner.run_swap(&state, &mut clock).await;
    assert!(!clock.ready(ActionKind::Swap));
}

#[tokio::test]
async fn test_below_minimum_place_is_silent() {
    let mut state = priced_state();
    // Sub-minimum inventory right after a fill.
    state.apply(CacheEvent::BaseWallet(0.4));
    state.apply(CacheEvent::AskBook {
        orders: vec![],
        levels: vec![Level::new(1.50, 3.0), Level::new(1.60, 80.0)],
    });

    let mut orders = MockOrders::new();
    orders.expect_place_order().never();
    let mut alerts = MockAlerts::new();
    alerts.expect_info().never();
    alerts.expect_error().never();
    let runner = runner(orders, MockLedger::new(), alerts);

    let policy = DecisionPolicy::new(6.0, 2);
    let mut clock = ActionClock::new(Duration::from_secs(10));

    let outcome = runner.run_place(&mut state, &mut clock, &policy).await;
    assert_eq!(outcome, PlaceOutcome::BelowMinimum);
    // Nothing was submitted, so the place clock was never stamped.
    assert!(clock.ready(ActionKind::Place));
}

#[tokio::test]
async fn test_settle_cancels_drifted_quote_in_same_cycle() {
    let mut state = priced_state();
    state.apply(CacheEvent::OpenOrders {
        base_unsettled: 0.0,
        quote_unsettled: 20.0,
    });
    // Last placed 10 @ 10.0, but only 8.5 still rests: >10% filled away.
    state.user.last_order = LastOrder {
        price: 10.0,
        size: 10.0,
    };
    state.apply(CacheEvent::AskBook {
        orders: vec![my_order(10.0, 8.5)],
        levels: vec![Level::new(10.0, 8.5)],
    });

    let mut orders = MockOrders::new();
    orders
        .expect_settle_funds()
        .times(1)
        .returning(|| Ok("tx-settle".to_string()));
    orders
        .expect_cancel_order()
        .times(1)
        .returning(|_| Ok("tx-cancel".to_string()));
    let runner = runner(orders, MockLedger::new(), quiet_notifier());

    let policy = DecisionPolicy::new(6.0, 2);
    let mut clock = ActionClock::new(Duration::from_secs(10));

    runner.run_settle(&state, &mut clock, &policy).await;
    assert!(!clock.ready(ActionKind::Settle));
    assert!(!clock.ready(ActionKind::Cancel), "drift cancel stamps its clock");
}

#[tokio::test]
async fn test_drifted_settle_cancels_every_own_order() {
    let mut state = priced_state();
    state.apply(CacheEvent::OpenOrders {
        base_unsettled: 0.0,
        quote_unsettled: 20.0,
    });
    state.user.last_order = LastOrder {
        price: 10.0,
        size: 10.0,
    };
    // Two own orders survive the fill; both must come off the book.
    state.apply(CacheEvent::AskBook {
        orders: vec![my_order(10.0, 8.5), my_order(10.5, 3.0)],
        levels: vec![Level::new(10.0, 8.5), Level::new(10.5, 3.0)],
    });

    let mut orders = MockOrders::new();
    orders
        .expect_settle_funds()
        .times(1)
        .returning(|| Ok("tx-settle".to_string()));
    orders
        .expect_cancel_order()
        .times(2)
        .returning(|_| Ok("tx-cancel".to_string()));
    let runner = runner(orders, MockLedger::new(), quiet_notifier());

    let policy = DecisionPolicy::new(6.0, 2);
    let mut clock = ActionClock::new(Duration::from_secs(10));

    runner.run_settle(&state, &mut clock, &policy).await;
    assert!(!clock.ready(ActionKind::Cancel));
}

#[tokio::test]
async fn test_settle_without_drift_leaves_orders_alone() {
    let mut state = priced_state();
    state.apply(CacheEvent::OpenOrders {
        base_unsettled: 0.0,
        quote_unsettled: 0.3,
    });
    state.user.last_order = LastOrder {
        price: 10.0,
        size: 10.0,
    };
    state.apply(CacheEvent::AskBook {
        orders: vec![my_order(10.0, 10.0)],
        levels: vec![Level::new(10.0, 10.0)],
    });

    let mut orders = MockOrders::new();
    orders
        .expect_settle_funds()
        .times(1)
        .returning(|| Ok("tx-settle".to_string()));
    orders.expect_cancel_order().never();
    let runner = runner(orders, MockLedger::new(), quiet_notifier());

    let policy = DecisionPolicy::new(6.0, 2);
    let mut clock = ActionClock::new(Duration::from_secs(10));

    runner.run_settle(&state, &mut clock, &policy).await;
    assert!(clock.ready(ActionKind::Cancel));
}

#[tokio::test]
async fn test_cancel_fires_one_tx_per_own_order() {
    let mut state = priced_state();
    state.apply(CacheEvent::AskBook {
        orders: vec![
            my_order(1.0, 2.0),
            RestingOrder {
                order_id: 7,
                owner: "someone-else".to_string(),
                price: 1.05,
                size: 9.0,
            },
            my_order(1.10, 3.0),
        ],
        levels: vec![
            Level::new(1.0, 2.0),
            Level::new(1.05, 9.0),
            Level::new(1.10, 3.0),
        ],
    });

    let mut orders = MockOrders::new();
    orders
        .expect_cancel_order()
        .times(2)
        .returning(|_| Ok("tx-cancel".to_string()));
    let runner = runner(orders, MockLedger::new(), quiet_notifier());

    let mut clock = ActionClock::new(Duration::from_secs(10));
    let diagnostics = CancelDiagnostics {
        narrowed_deviation: true,
        ..Default::default()
    };
    runner.run_cancel(&state, &mut clock, diagnostics).await;
    assert!(!clock.ready(ActionKind::Cancel));
}

#[tokio::test]
async fn test_failed_action_reports_but_does_not_panic() {
    let mut state = priced_state();
    state.apply(CacheEvent::OpenOrders {
        base_unsettled: 0.0,
        quote_unsettled: 5.0,
    });

    let mut orders = MockOrders::new();
    orders
        .expect_settle_funds()
        .times(1)
        .returning(|| Err(anyhow::anyhow!("venue rejected the settle")));
    let mut alerts = MockAlerts::new();
    alerts.expect_error().times(1).returning(|_, _| ());
    let runner = runner(orders, MockLedger::new(), alerts);

    let policy = DecisionPolicy::new(6.0, 2);
    let mut clock = ActionClock::new(Duration::from_secs(10));

    runner.run_settle(&state, &mut clock, &policy).await;
    // The cooldown still applies after a failure.
    assert!(!clock.ready(ActionKind::Settle));
}
