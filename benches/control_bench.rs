//! Control Loop Benchmarks - Hot-Path Performance Validation
//!
//! Benchmarks the functions evaluated on every tick and every book push.
//!
//! Run with: cargo bench --bench control_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use amm_maker_bot::domain::book::{better_level, Level, RestingOrder};
use amm_maker_bot::domain::clock::ActionClock;
use amm_maker_bot::domain::policy::DecisionPolicy;
use amm_maker_bot::domain::rate::{swap_rate, SwapVenue};
use amm_maker_bot::domain::state::{BotState, CacheEvent};

fn deep_book() -> Vec<Level> {
    (0..20)
        .map(|i| Level::new(10.0 + f64::from(i) * 0.01, 1.0 + f64::from(i)))
        .collect()
}

/// State resembling a live market: priced pool, 20-level book, one own order.
fn live_state() -> BotState {
    let mut state = BotState::new(SwapVenue::Prism, "me".to_string());
    state.apply(CacheEvent::PoolBase(1_000_000.0));
    state.apply(CacheEvent::PoolQuote(1_000_000.0));
    let levels = deep_book();
    let orders = vec![RestingOrder {
        order_id: 1,
        owner: "me".to_string(),
        price: levels[0].price,
        size: levels[0].size,
    }];
    state.apply(CacheEvent::AskBook { orders, levels });
    state
}

/// Benchmark the fee-adjusted rate computation.
fn bench_swap_rate(c: &mut Criterion) {
    c.bench_function("swap_rate", |b| {
        b.iter(|| {
            swap_rate(
                black_box(1_000_000.0),
                black_box(1_000_000.0),
                black_box(0.0025),
            )
        });
    });
}

/// Benchmark the depth-skipping price lookup over a full 20-level book.
fn bench_better_level(c: &mut Criterion) {
    let levels = deep_book();
    c.bench_function("better_level_20_levels", |b| {
        b.iter(|| better_level(black_box(&levels), black_box(6.0), black_box(0)));
    });
}

/// Benchmark one full decision ladder evaluation.
fn bench_decide(c: &mut Criterion) {
    let state = live_state();
    let policy = DecisionPolicy::new(6.0, 2);
    let clock = ActionClock::default();

    c.bench_function("policy_decide", |b| {
        b.iter(|| policy.decide(black_box(&state), black_box(&clock)));
    });
}

criterion_group!(benches, bench_swap_rate, bench_better_level, bench_decide);
criterion_main!(benches);
