//! Constant-product swap-rate model.
//!
//! Derives the reference exchange rate from pool reserves: the rate is the
//! quote-per-base price implied by swapping a fixed 100-unit quote notional
//! through the pool, adjusted for the venue's swap fee. Each supported swap
//! venue carries a fixed fee percentage.

use serde::{Deserialize, Serialize};

/// Fixed quote notional the reference rate is computed for.
pub const REFERENCE_NOTIONAL: f64 = 100.0;

/// Supported constant-product swap venues, each with a fixed fee rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapVenue {
    Prism,
    Cascade,
}

impl SwapVenue {
    /// Venue swap fee as a fraction of the input amount.
    pub fn fee_rate(self) -> f64 {
        match self {
            Self::Prism => 0.0025,
            Self::Cascade => 0.003,
        }
    }
}

impl std::fmt::Display for SwapVenue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prism => write!(f, "prism"),
            Self::Cascade => write!(f, "cascade"),
        }
    }
}

/// Fee-adjusted quote-per-base rate for swapping the reference notional.
///
/// `base_out = base_pool * (1 - quote_pool / (quote_pool + 100))` is the
/// base amount received for 100 quote units; the average price per unit is
/// `base_out / 100`, and the returned rate is its fee-adjusted inverse.
pub fn swap_rate(base_pool: f64, quote_pool: f64, fee_rate: f64) -> f64 {
    let base_out =
        base_pool * (1.0 - quote_pool / (quote_pool + REFERENCE_NOTIONAL));
    let avg_price_per_unit = base_out / REFERENCE_NOTIONAL;
    1.0 / (avg_price_per_unit * (1.0 - fee_rate))
}

/// Latest observed pool reserves and the rate derived from them.
///
/// Reserves are updated independently per reserve-account push; the rate is
/// recomputed only once both sides have been observed non-zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolReserves {
    pub base: f64,
    pub quote: f64,
    pub rate: f64,
}

impl PoolReserves {
    pub fn observe_base(&mut self, amount: f64, venue: SwapVenue) {
        self.base = amount;
        self.recompute(venue);
    }

    pub fn observe_quote(&mut self, amount: f64, venue: SwapVenue) {
        self.quote = amount;
        self.recompute(venue);
    }

    fn recompute(&mut self, venue: SwapVenue) {
        if self.base > 0.0 && self.quote > 0.0 {
            self.rate = swap_rate(self.base, self.quote, venue.fee_rate());
        }
    }
}
