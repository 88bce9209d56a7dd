//! Order book depth types and the depth-skipping price lookup.
//!
//! The book is kept in two shapes: raw resting orders (owner-tagged, so the
//! bot can recognize its own quotes) and an aggregated top-20 level view
//! used by the better-price lookup. The lookup walks the aggregated levels
//! from the top, treating everything up to a configured cumulative size as
//! ignorable noise/spoof depth, and returns the first level beyond it.

use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

/// Account address in the venue's encoded string form.
pub type AccountId = String;

/// One aggregated price level: (price, total size) in human units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    pub size: f64,
}

impl Level {
    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }
}

/// A single resting order visible on one side of the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingOrder {
    /// Venue-assigned order identifier.
    pub order_id: u128,
    /// Open-orders account that placed the order.
    pub owner: AccountId,
    pub price: f64,
    pub size: f64,
}

/// Aggregated book depth plus the raw ask-side order set.
///
/// Asks carry both shapes because the decision logic matches its own
/// resting orders per-order. Bids are refreshed on demand only and never
/// drive an action, so the raw bid set is not retained.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    /// Raw ask-side orders sorted by ascending price.
    pub ask_orders: Vec<RestingOrder>,
    /// Aggregated ask levels, ascending price, top 20.
    pub asks: Vec<Level>,
    /// Aggregated bid levels, descending price, top 20.
    pub bids: Vec<Level>,
}

/// Walk `levels` from the top accumulating size; the depth whose cumulative
/// size does not exceed `ignore_amount` is treated as noise, and the first
/// level beyond it is the reference "better" price. `offset` selects deeper
/// levels past the reference; when the offset (or the whole walk) runs past
/// the end of the array, the last available level is reused rather than
/// failing.
///
/// Returns `None` only for an empty book.
pub fn better_level(levels: &[Level], ignore_amount: f64, offset: usize) -> Option<Level> {
    if levels.is_empty() {
        return None;
    }
    let mut cumulative = 0.0;
    let mut base = levels.len();
    for (i, level) in levels.iter().enumerate() {
        cumulative += level.size;
        if cumulative > ignore_amount {
            base = i + 1;
            break;
        }
    }
    let idx = (base + offset).min(levels.len() - 1);
    Some(levels[idx])
}

/// Minimum price increment for the given decimal precision.
pub fn tick_size(decimals: u32) -> f64 {
    10f64.powi(-(decimals as i32))
}

/// Round a price to the venue's tick grid (half away from zero).
///
/// Done through `Decimal` so that quoted prices are exact on the grid
/// instead of carrying float residue into the wire encoding.
pub fn round_to_tick(value: f64, decimals: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asks() -> Vec<Level> {
        vec![
            Level::new(10.0, 5.0),
            Level::new(10.1, 3.0),
            Level::new(10.2, 50.0),
        ]
    }

    #[test]
    fn test_better_level_skips_ignorable_depth() {
        // 5 + 3 = 8 > 6, so the first two levels are noise.
        let level = better_level(&asks(), 6.0, 0).unwrap();
        assert_eq!(level.price, 10.2);
        assert_eq!(level.size, 50.0);
    }

    #[test]
    fn test_better_level_offset_walks_deeper() {
        let level = better_level(&asks(), 4.0, 1).unwrap();
        assert_eq!(level.price, 10.2);
    }

    #[test]
    fn test_better_level_offset_past_end_reuses_last() {
        let level = better_level(&asks(), 6.0, 5).unwrap();
        assert_eq!(level.price, 10.2);
    }

    #[test]
    fn test_better_level_all_depth_ignorable_falls_back_to_last() {
        let level = better_level(&asks(), 1000.0, 0).unwrap();
        assert_eq!(level.price, 10.2);
    }

    #[test]
    fn test_better_level_empty_book() {
        assert!(better_level(&[], 6.0, 0).is_none());
    }

    #[test]
    fn test_tick_size() {
        assert!((tick_size(2) - 0.01).abs() < 1e-12);
        assert!((tick_size(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_to_tick_exact_grid() {
        assert_eq!(round_to_tick(10.116, 2), 10.12);
        assert_eq!(round_to_tick(10.114, 2), 10.11);
        // One tick below 10.2 on a 2-decimal grid.
        assert_eq!(round_to_tick(10.2 - 0.01, 2), 10.19);
    }
}
